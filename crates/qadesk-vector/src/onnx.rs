//! Shared ONNX session and tokenizer loading.
//!
//! Both the sentence encoder and the cross-encoder expect a model directory
//! containing `model.onnx` and `tokenizer.json`. Every failure here maps to
//! `ModelLoad` so the boundary can tell an unloadable model apart from a
//! missing index artifact.

use std::path::Path;

use ort::session::Session;
use tokenizers::Tokenizer;

use qadesk_core::error::{QadeskError, Result};

/// Build an ONNX Runtime session from a model file.
pub(crate) fn load_session(model_path: &Path) -> Result<Session> {
    if !model_path.exists() {
        return Err(QadeskError::ModelLoad(format!(
            "ONNX model not found at {}",
            model_path.display()
        )));
    }

    Session::builder()
        .map_err(|e| QadeskError::ModelLoad(format!("ONNX session builder: {}", e)))?
        .with_intra_threads(1)
        .map_err(|e| QadeskError::ModelLoad(format!("ONNX set threads: {}", e)))?
        .commit_from_file(model_path)
        .map_err(|e| QadeskError::ModelLoad(format!("ONNX load model: {}", e)))
}

/// Load a HuggingFace fast-tokenizer file.
pub(crate) fn load_tokenizer(tokenizer_path: &Path) -> Result<Tokenizer> {
    if !tokenizer_path.exists() {
        return Err(QadeskError::ModelLoad(format!(
            "Tokenizer not found at {}",
            tokenizer_path.display()
        )));
    }

    Tokenizer::from_file(tokenizer_path)
        .map_err(|e| QadeskError::ModelLoad(format!("Failed to load tokenizer: {}", e)))
}
