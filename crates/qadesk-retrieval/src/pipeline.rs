//! Retrieval pipeline: encode, search, resolve, rerank, rank.
//!
//! One query flows synchronously end-to-end through the pipeline; there is
//! no cross-query state, so a single pipeline can serve concurrent queries
//! over its shared read-only context.

use std::sync::Arc;

use tracing::{debug, warn};

use qadesk_core::error::{QadeskError, Result};
use qadesk_core::types::{Candidate, ScoredCandidate};

use crate::context::RetrievalContext;

/// Orchestrates encoder, vector index, corpus store, and reranker.
pub struct RetrievalPipeline {
    context: Arc<RetrievalContext>,
}

impl RetrievalPipeline {
    pub fn new(context: Arc<RetrievalContext>) -> Self {
        Self { context }
    }

    /// Retrieve and rerank the best matches for a query.
    ///
    /// `coarse_k` controls how many nearest neighbors the vector index
    /// surfaces; `rerank_k` how many survive cross-encoder reranking. The
    /// result holds at most `rerank_k` candidates sorted by reranker score
    /// descending; tied scores keep their coarse nearest-neighbor order.
    ///
    /// An empty result means no valid candidates, a normal outcome kept
    /// distinct from load and inference errors.
    pub async fn retrieve_top_k(
        &self,
        query: &str,
        coarse_k: usize,
        rerank_k: usize,
    ) -> Result<Vec<ScoredCandidate>> {
        if rerank_k == 0 {
            return Ok(Vec::new());
        }

        // The reranker can only reorder what the coarse stage surfaced; a
        // smaller coarse_k would silently starve it.
        let coarse_k = if coarse_k < rerank_k {
            warn!(coarse_k, rerank_k, "coarse_k below rerank_k; clamping up");
            rerank_k
        } else {
            coarse_k
        };

        let query_vec = self.context.embedder.embed_boxed(query).await?;
        let hits = self.context.index.search(&query_vec, coarse_k)?;

        // Resolve hits against the corpus store. An unresolvable position
        // means the index and corpus drifted apart; drop the hit loudly.
        let mut candidates: Vec<Candidate> = Vec::with_capacity(hits.len());
        for hit in hits {
            match self.context.corpus.get(hit.position) {
                Some(record) => candidates.push(Candidate {
                    position: hit.position,
                    record: record.clone(),
                }),
                None => warn!(
                    position = hit.position,
                    "index hit has no corpus record; dropping"
                ),
            }
        }

        if candidates.is_empty() {
            debug!(query_len = query.len(), "no valid candidates");
            return Ok(Vec::new());
        }

        // One batched reranker call over the full question+answer text of
        // every candidate.
        let pair_texts: Vec<String> = candidates
            .iter()
            .map(|c| c.record.rerank_text())
            .collect();
        let scores = self
            .context
            .reranker
            .score_pairs_boxed(query, &pair_texts)
            .await?;

        if scores.len() != candidates.len() {
            return Err(QadeskError::Inference(format!(
                "reranker returned {} scores for {} candidates",
                scores.len(),
                candidates.len()
            )));
        }

        let mut scored: Vec<ScoredCandidate> = scores
            .into_iter()
            .zip(candidates)
            .map(|(score, candidate)| ScoredCandidate { score, candidate })
            .collect();

        // Stable sort: tied reranker scores keep nearest-neighbor order.
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(rerank_k);

        debug!(
            results = scored.len(),
            top_score = ?scored.first().map(|s| s.score),
            "retrieval complete"
        );

        Ok(scored)
    }

    /// The shared context this pipeline runs against.
    pub fn context(&self) -> &RetrievalContext {
        &self.context
    }
}
