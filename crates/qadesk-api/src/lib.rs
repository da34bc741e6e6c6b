//! Qadesk API crate - HTTP surface over the chat responder.
//!
//! Exposes `/ask`, `/history/{session_id}`, and `/health`, with the error
//! mapping that distinguishes retrieval-infrastructure failures (503,
//! administrator-facing) from generic internal errors (500, generic text).

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
