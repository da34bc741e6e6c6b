use thiserror::Error;

/// Top-level error type for the Qadesk system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates convert
/// their own errors into `QadeskError` so that the `?` operator works
/// seamlessly across crate boundaries.
///
/// The three load-time variants (`ModelLoad`, `DataNotFound`, `DataCorrupt`)
/// form the "retrieval infrastructure failure" category (see
/// [`QadeskError::is_infrastructure`]). They are kept distinct so diagnostics
/// point at the right subsystem: a missing index artifact is fixed very
/// differently from an uninitializable ONNX session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QadeskError {
    /// The embedding encoder or cross-encoder reranker could not be loaded
    /// or initialized (missing weights, missing tokenizer, session failure).
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// A required data artifact is absent on disk. The message names the
    /// missing artifact so the operator knows what to restore.
    #[error("Data not found: {0}")]
    DataNotFound(String),

    /// A data artifact exists but is unreadable, malformed, or failed
    /// load-time validation (checksum, dimension, alignment).
    #[error("Data corrupt: {0}")]
    DataCorrupt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QadeskError {
    /// True exactly for the retrieval-infrastructure failure category:
    /// encoder/reranker unavailable, or the index/corpus artifact missing
    /// or invalid.
    ///
    /// The chat and API boundaries branch on this to surface an
    /// administrator-facing message instead of the generic failure text
    /// shown for all other errors.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            QadeskError::ModelLoad(_) | QadeskError::DataNotFound(_) | QadeskError::DataCorrupt(_)
        )
    }
}

impl From<toml::de::Error> for QadeskError {
    fn from(err: toml::de::Error) -> Self {
        QadeskError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for QadeskError {
    fn from(err: toml::ser::Error) -> Self {
        QadeskError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QadeskError {
    fn from(err: serde_json::Error) -> Self {
        QadeskError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Qadesk operations.
pub type Result<T> = std::result::Result<T, QadeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = QadeskError::ModelLoad("tokenizer.json missing".to_string());
        assert_eq!(err.to_string(), "Model load error: tokenizer.json missing");

        let err = QadeskError::DataNotFound("/data/qa_index.json".to_string());
        assert_eq!(err.to_string(), "Data not found: /data/qa_index.json");

        let err = QadeskError::DataCorrupt("checksum mismatch".to_string());
        assert_eq!(err.to_string(), "Data corrupt: checksum mismatch");

        let err = QadeskError::Search("dimension mismatch".to_string());
        assert_eq!(err.to_string(), "Search error: dimension mismatch");
    }

    #[test]
    fn test_infrastructure_category() {
        assert!(QadeskError::ModelLoad("x".into()).is_infrastructure());
        assert!(QadeskError::DataNotFound("x".into()).is_infrastructure());
        assert!(QadeskError::DataCorrupt("x".into()).is_infrastructure());

        assert!(!QadeskError::Config("x".into()).is_infrastructure());
        assert!(!QadeskError::Inference("x".into()).is_infrastructure());
        assert!(!QadeskError::Search("x".into()).is_infrastructure());
        assert!(!QadeskError::Api("x".into()).is_infrastructure());
        assert!(!QadeskError::Serialization("x".into()).is_infrastructure());
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "broken pipe");
        assert!(!QadeskError::Io(io).is_infrastructure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: QadeskError = io_err.into();
        assert!(matches!(err, QadeskError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let parsed: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: QadeskError = parsed.unwrap_err().into();
        assert!(matches!(err, QadeskError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let parsed: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        let err: QadeskError = parsed.unwrap_err().into();
        assert!(matches!(err, QadeskError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }
}
