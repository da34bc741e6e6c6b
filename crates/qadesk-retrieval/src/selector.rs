//! Answer selection: threshold policy over reranked candidates.
//!
//! Deliberately precision-over-recall: a query whose best candidate scores
//! under the answer threshold is refused rather than answered with a
//! low-confidence guess. Stateless per query.

use tracing::debug;

use qadesk_core::config::RetrievalConfig;
use qadesk_core::types::{AnswerResponse, ScoredCandidate};

/// Confidence thresholds applied to a reranked candidate list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    /// Minimum top score required to answer at all.
    pub answer_threshold: f32,
    /// Minimum score for a secondary suggestion to be shown.
    pub suggestion_threshold: f32,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            answer_threshold: 0.5,
            suggestion_threshold: 0.1,
        }
    }
}

impl SelectionPolicy {
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            answer_threshold: config.answer_threshold,
            suggestion_threshold: config.suggestion_threshold,
        }
    }

    /// Decide the response for a reranked, score-descending candidate list.
    pub fn select(&self, scored: &[ScoredCandidate]) -> AnswerResponse {
        let Some(top) = scored.first() else {
            return AnswerResponse::NoMatch;
        };

        if top.score < self.answer_threshold {
            debug!(
                top_score = top.score,
                threshold = self.answer_threshold,
                "declining: top score below answer threshold"
            );
            return AnswerResponse::BelowThreshold {
                top_score: top.score,
            };
        }

        let suggestions = scored[1..]
            .iter()
            .filter(|s| s.score > self.suggestion_threshold)
            .map(|s| s.candidate.record.clone())
            .collect();

        AnswerResponse::Answer {
            primary: top.candidate.record.clone(),
            suggestions,
        }
    }
}
