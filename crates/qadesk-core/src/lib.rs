pub mod config;
pub mod error;
pub mod types;

pub use config::QadeskConfig;
pub use error::{QadeskError, Result};
pub use types::*;
