//! Application state shared across all route handlers.
//!
//! AppState holds the configuration and the chat responder. All fields use
//! `Arc` for cheap cloning across handler tasks; everything behind them is
//! either read-only or internally synchronized.

use std::sync::Arc;
use std::time::Instant;

use qadesk_chat::ChatResponder;
use qadesk_core::config::QadeskConfig;
use qadesk_retrieval::ContextLoader;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<QadeskConfig>,
    /// Conversational boundary over the retrieval pipeline.
    pub responder: Arc<ChatResponder>,
    /// Server start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around the given context loader.
    pub fn new(config: QadeskConfig, loader: Arc<ContextLoader>) -> Self {
        let responder = Arc::new(ChatResponder::new(&config, loader));
        Self {
            config: Arc::new(config),
            responder,
            start_time: Instant::now(),
        }
    }
}
