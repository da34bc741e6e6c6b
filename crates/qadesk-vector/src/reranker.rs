//! Cross-encoder reranker: joint (query, candidate-text) relevance scoring.
//!
//! A cross-encoder reads the query and a candidate text together and emits a
//! single relevance score, which is more accurate than the coarse
//! inner-product similarity but too expensive to run over the whole corpus.
//! It is applied only to the candidate set the vector index surfaces.
//!
//! - `OnnxCrossEncoder` runs an ms-marco-style cross-encoder ONNX export.
//! - `MockReranker` scores by lexical overlap for testing.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ort::session::Session;
use ort::value::TensorRef;
use tokenizers::Tokenizer;
use tracing::info;

use qadesk_core::error::{QadeskError, Result};

use crate::onnx;

/// Service for scoring (query, candidate-text) pairs.
///
/// The whole candidate set is scored in one batched call. Callers must not
/// loop over single pairs; per-pair invocation forfeits the batching the
/// model run is paid for.
pub trait RerankService: Send + Sync {
    /// Score every `(query, text)` pair in one batch.
    ///
    /// Returns one relevance score per text, in input order. Scores are in
    /// [0, 1]; they live on the reranker's own scale and are not comparable
    /// to the index's inner-product similarities.
    fn score_pairs(
        &self,
        query: &str,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<f32>>> + Send;
}

/// Object-safe version of [`RerankService`] for dynamic dispatch.
pub trait DynRerankService: Send + Sync {
    /// Score every `(query, text)` pair in one batch (boxed future).
    fn score_pairs_boxed<'a>(
        &'a self,
        query: &'a str,
        texts: &'a [String],
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>>> + Send + 'a>>;
}

impl<T: RerankService> DynRerankService for T {
    fn score_pairs_boxed<'a>(
        &'a self,
        query: &'a str,
        texts: &'a [String],
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<f32>>> + Send + 'a>> {
        Box::pin(self.score_pairs(query, texts))
    }
}

// ---------------------------------------------------------------------------
// OnnxCrossEncoder - real ONNX Runtime inference
// ---------------------------------------------------------------------------

/// ONNX Runtime-backed cross-encoder (e.g. ms-marco-TinyBERT-L-2-v2).
///
/// Expects a model directory containing `model.onnx` and `tokenizer.json`.
/// Each pair is tokenized jointly (query as sequence A, candidate text as
/// sequence B), the batch is padded to its longest sequence, and the
/// classifier's relevance logit is squashed through a sigmoid.
pub struct OnnxCrossEncoder {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
}

// ort::Session is Send + Sync internally (uses Arc<SharedSessionInner>).
unsafe impl Send for OnnxCrossEncoder {}
unsafe impl Sync for OnnxCrossEncoder {}

impl std::fmt::Debug for OnnxCrossEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxCrossEncoder").finish()
    }
}

impl OnnxCrossEncoder {
    /// Load a cross-encoder model from the given directory.
    ///
    /// The directory must contain `model.onnx` and `tokenizer.json`. Any
    /// failure is a `ModelLoad` error.
    pub fn from_directory(model_dir: &Path) -> Result<Self> {
        Self::from_files(
            &model_dir.join("model.onnx"),
            &model_dir.join("tokenizer.json"),
        )
    }

    /// Load from explicit model and tokenizer file paths.
    pub fn from_files(model_path: &Path, tokenizer_path: &Path) -> Result<Self> {
        let session = onnx::load_session(model_path)?;
        let tokenizer = onnx::load_tokenizer(tokenizer_path)?;

        info!(model = %model_path.display(), "Loaded ONNX cross-encoder model");

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
        })
    }

    /// Tokenize all pairs, run one padded batch, sigmoid the logits.
    fn score_sync(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut encodings = Vec::with_capacity(texts.len());
        for text in texts {
            let encoding = self
                .tokenizer
                .encode((query, text.as_str()), true)
                .map_err(|e| QadeskError::Inference(format!("Pair tokenization failed: {}", e)))?;
            encodings.push(encoding);
        }

        let batch = encodings.len();
        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0);
        if max_len == 0 {
            return Err(QadeskError::Inference(
                "Tokenizer produced empty encodings".to_string(),
            ));
        }

        // Pad each encoding to the batch maximum. Padded positions carry
        // attention mask 0 so they do not contribute to the score.
        let mut input_ids = vec![0i64; batch * max_len];
        let mut attention_mask = vec![0i64; batch * max_len];
        let mut token_type_ids = vec![0i64; batch * max_len];

        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * max_len;
            for (col, &id) in encoding.get_ids().iter().enumerate() {
                input_ids[offset + col] = id as i64;
            }
            for (col, &m) in encoding.get_attention_mask().iter().enumerate() {
                attention_mask[offset + col] = m as i64;
            }
            for (col, &t) in encoding.get_type_ids().iter().enumerate() {
                token_type_ids[offset + col] = t as i64;
            }
        }

        let ids_array = ndarray::Array2::from_shape_vec((batch, max_len), input_ids)
            .map_err(|e| QadeskError::Inference(format!("input_ids array: {}", e)))?;
        let mask_array = ndarray::Array2::from_shape_vec((batch, max_len), attention_mask)
            .map_err(|e| QadeskError::Inference(format!("attention_mask array: {}", e)))?;
        let type_array = ndarray::Array2::from_shape_vec((batch, max_len), token_type_ids)
            .map_err(|e| QadeskError::Inference(format!("token_type_ids array: {}", e)))?;

        let ids_ref = TensorRef::from_array_view(&ids_array)
            .map_err(|e| QadeskError::Inference(format!("TensorRef input_ids: {}", e)))?;
        let mask_ref = TensorRef::from_array_view(&mask_array)
            .map_err(|e| QadeskError::Inference(format!("TensorRef attention_mask: {}", e)))?;
        let type_ref = TensorRef::from_array_view(&type_array)
            .map_err(|e| QadeskError::Inference(format!("TensorRef token_type_ids: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| QadeskError::Inference(format!("Session lock poisoned: {}", e)))?;
        let outputs = session
            .run(ort::inputs![ids_ref, mask_ref, type_ref])
            .map_err(|e| QadeskError::Inference(format!("ONNX inference failed: {}", e)))?;

        // Classifier output is [batch, 1] (or [batch]) relevance logits.
        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| QadeskError::Inference(format!("Extract logits: {}", e)))?;

        let shape_dims: Vec<i64> = shape.iter().copied().collect();
        let cols: usize = shape_dims
            .iter()
            .skip(1)
            .map(|&d| d.max(1) as usize)
            .product::<usize>()
            .max(1);

        if data.len() < batch * cols {
            return Err(QadeskError::Inference(format!(
                "Unexpected logit shape {:?} for batch of {}",
                shape_dims, batch
            )));
        }

        let scores = (0..batch)
            .map(|row| sigmoid(data[row * cols]))
            .collect();

        Ok(scores)
    }
}

impl RerankService for OnnxCrossEncoder {
    async fn score_pairs(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        // ONNX Runtime inference is CPU-bound; run on a blocking thread.
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let query_owned = query.to_string();
        let texts_owned = texts.to_vec();

        tokio::task::spawn_blocking(move || {
            let svc = OnnxCrossEncoder { session, tokenizer };
            svc.score_sync(&query_owned, &texts_owned)
        })
        .await
        .map_err(|e| QadeskError::Inference(format!("Rerank task panicked: {}", e)))?
    }
}

/// Squash a logit into (0, 1).
fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

// ---------------------------------------------------------------------------
// MockReranker - deterministic lexical-overlap scores for testing
// ---------------------------------------------------------------------------

/// Mock reranker scoring by word overlap between query and candidate text.
///
/// score = |query words ∩ text words| / |query words|, lowercased. This is
/// deterministic, bounded to [0, 1], and gives higher scores to candidates
/// that actually share vocabulary with the query, which is enough to test
/// ordering and threshold policy.
#[derive(Debug, Clone, Default)]
pub struct MockReranker;

impl MockReranker {
    pub fn new() -> Self {
        Self
    }

    fn overlap_score(query: &str, text: &str) -> f32 {
        let query_lower = query.to_lowercase();
        let query_words: HashSet<&str> = query_lower.split_whitespace().collect();
        if query_words.is_empty() {
            return 0.0;
        }

        let text_lower = text.to_lowercase();
        let text_words: HashSet<&str> = text_lower.split_whitespace().collect();

        let overlap = query_words.iter().filter(|w| text_words.contains(*w)).count();
        overlap as f32 / query_words.len() as f32
    }
}

impl RerankService for MockReranker {
    async fn score_pairs(&self, query: &str, texts: &[String]) -> Result<Vec<f32>> {
        Ok(texts
            .iter()
            .map(|text| Self::overlap_score(query, text))
            .collect())
    }
}
