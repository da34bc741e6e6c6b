use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{QadeskError, Result};

/// File name of the combined index artifact inside the data directory.
pub const INDEX_ARTIFACT_FILE: &str = "qa_index.json";

/// Top-level configuration for the Qadesk application.
///
/// Loaded from `~/.qadesk/config.toml` by default. Each section corresponds
/// to one subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QadeskConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub models: ModelConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl QadeskConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: QadeskConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| QadeskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Path of the combined index artifact under the data directory.
    pub fn index_artifact_path(&self) -> PathBuf {
        Path::new(&self.general.data_dir).join(INDEX_ARTIFACT_FILE)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory holding the index artifact.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// API server port.
    pub port: u16,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.qadesk/data".to_string(),
            log_level: "info".to_string(),
            port: 3030,
        }
    }
}

/// Model locations and identity.
///
/// Each directory must contain `model.onnx` and `tokenizer.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory of the sentence-encoder ONNX export.
    pub embedding_dir: String,
    /// Directory of the cross-encoder ONNX export.
    pub reranker_dir: String,
    /// Name of the embedding model, recorded in (and validated against)
    /// the index artifact so a stale index cannot be paired with a
    /// different encoder.
    pub embedding_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_dir: "models/all-MiniLM-L6-v2".to_string(),
            reranker_dir: "models/ms-marco-TinyBERT-L-2-v2".to_string(),
            embedding_model: "all-MiniLM-L6-v2".to_string(),
        }
    }
}

/// Retrieval pipeline tuning and answer policy.
///
/// The thresholds are policy parameters carried over from the original
/// deployment; they are not calibrated for other corpora.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Nearest neighbors fetched from the vector index per query.
    pub coarse_k: usize,
    /// Results kept after cross-encoder reranking. Must not exceed
    /// `coarse_k`; the pipeline clamps `coarse_k` up if it does.
    pub rerank_k: usize,
    /// Minimum top relevance score to answer at all.
    pub answer_threshold: f32,
    /// Minimum relevance score for secondary suggestions.
    pub suggestion_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            coarse_k: 10,
            rerank_k: 3,
            answer_threshold: 0.5,
            suggestion_threshold: 0.1,
        }
    }
}

/// Conversational boundary settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Maximum query length in words.
    pub max_query_words: usize,
    /// Minimum query length in characters.
    pub min_query_chars: usize,
    /// Turns shown when the user asks for their history.
    pub history_display_limit: usize,
    /// Maximum concurrent sessions kept in memory.
    pub max_sessions: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_query_words: 200,
            min_query_chars: 3,
            history_display_limit: 3,
            max_sessions: 256,
        }
    }
}
