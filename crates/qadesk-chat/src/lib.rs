//! Qadesk chat crate - the conversational boundary over the retrieval core.
//!
//! Handles everything between a raw user message and the retrieval
//! pipeline: canned greetings, input validation, history requests, the
//! session-scoped conversation log, and the error downgrade policy that
//! keeps internal failure detail away from end users.

pub mod error;
pub mod greeting;
pub mod history;
pub mod responder;
pub mod validate;

pub use error::ChatError;
pub use history::ConversationLog;
pub use responder::{ChatReply, ChatResponder, ReplyKind};
pub use validate::{QueryRejection, QueryValidator};
