//! Qadesk application binary - composition root.
//!
//! Ties the crates together into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Load the retrieval context once (index artifact + ONNX models)
//! 3. Build the chat responder and axum router
//! 4. Serve the HTTP API
//!
//! A failed context load is fatal at startup: the classified error
//! (`ModelLoad` / `DataNotFound` / `DataCorrupt`) is logged verbatim for the
//! operator and the process exits non-zero.

mod cli;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use qadesk_api::{create_router, AppState};
use qadesk_core::config::QadeskConfig;
use qadesk_retrieval::ContextLoader;

use cli::CliArgs;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config first: the log level may come from it.
    let config_file = args.resolve_config_path();
    let mut config = QadeskConfig::load_or_default(&config_file);

    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    config.general.port = args.resolve_port(config.general.port);
    config.general.data_dir = expand_home(&config.general.data_dir)
        .to_string_lossy()
        .to_string();

    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting Qadesk v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // One-time retrieval context load: index artifact + both ONNX models.
    // Loading is the expensive step; everything after it is read-only shared
    // state.
    let loader = Arc::new(ContextLoader::from_config(config.clone()));
    match loader.get().await {
        Ok(context) => {
            tracing::info!(
                records = context.corpus.len(),
                dimension = context.index.dimension(),
                "Retrieval context loaded"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load retrieval context");
            return Err(e.into());
        }
    }

    let port = config.general.port;
    let state = AppState::new(config, loader);
    let router = create_router(state);

    let addr = format!("127.0.0.1:{}", port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "Failed to bind API server");
            return Err(e.into());
        }
    };
    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router).await?;

    Ok(())
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&path[2..])
    } else {
        PathBuf::from(path)
    }
}
