//! Error types for the conversational boundary.

use qadesk_core::error::QadeskError;

/// Errors from the chat responder.
///
/// Infrastructure failures keep their classified inner error so the caller
/// can show an administrator-facing message; everything else is downgraded
/// to a generic message before it reaches an end user.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    /// The retrieval infrastructure (models or index artifact) is
    /// unavailable. Logged verbatim for operators.
    #[error("retrieval infrastructure failure: {0}")]
    Infrastructure(QadeskError),
    /// Any other pipeline failure. Logged verbatim; the user-facing text is
    /// always the generic message.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<QadeskError> for ChatError {
    fn from(err: QadeskError) -> Self {
        if err.is_infrastructure() {
            ChatError::Infrastructure(err)
        } else {
            ChatError::Internal(err.to_string())
        }
    }
}

impl ChatError {
    /// Text safe to show an end user. Internal error detail never appears
    /// here.
    pub fn user_message(&self) -> &'static str {
        match self {
            ChatError::EmptyMessage => "Please enter a question.",
            ChatError::SessionNotFound(_) => "That conversation could not be found.",
            ChatError::Infrastructure(_) => {
                "The assistant is currently unavailable. Please contact the administrator."
            }
            ChatError::Internal(_) => "An unexpected error occurred. Please try again later.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infrastructure_errors_keep_classification() {
        let err: ChatError = QadeskError::ModelLoad("weights missing".to_string()).into();
        assert!(matches!(err, ChatError::Infrastructure(_)));
        assert!(err.to_string().contains("weights missing"));

        let err: ChatError = QadeskError::DataNotFound("qa_index.json".to_string()).into();
        assert!(matches!(err, ChatError::Infrastructure(_)));

        let err: ChatError = QadeskError::DataCorrupt("checksum".to_string()).into();
        assert!(matches!(err, ChatError::Infrastructure(_)));
    }

    #[test]
    fn test_other_errors_downgrade_to_internal() {
        let err: ChatError = QadeskError::Inference("tensor shape".to_string()).into();
        assert!(matches!(err, ChatError::Internal(_)));

        let err: ChatError = QadeskError::Search("dimension".to_string()).into();
        assert!(matches!(err, ChatError::Internal(_)));
    }

    #[test]
    fn test_user_messages_leak_nothing() {
        let err: ChatError = QadeskError::Inference("secret internal detail".to_string()).into();
        assert!(!err.user_message().contains("secret"));

        let err: ChatError = QadeskError::ModelLoad("/srv/models/encoder".to_string()).into();
        assert!(!err.user_message().contains("/srv"));
        assert!(err.user_message().contains("administrator"));
    }
}
