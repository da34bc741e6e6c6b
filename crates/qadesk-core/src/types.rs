use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single curated question/answer pair from the corpus.
///
/// Records are immutable once loaded and identified by their position in the
/// corpus store (a dense index 0..N-1). Each record corresponds to exactly
/// one embedded vector in the index at the same position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaRecord {
    pub question: String,
    pub answer: String,
}

impl QaRecord {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// The text the reranker scores against the query: question and answer
    /// joined with a single space. The answer text is included because it
    /// often carries relevance signal the question alone does not.
    pub fn rerank_text(&self) -> String {
        format!("{} {}", self.question, self.answer)
    }
}

/// An index hit resolved against the corpus store. Produced per query,
/// discarded after response formatting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Corpus position shared between the vector index and the corpus store.
    pub position: usize,
    pub record: QaRecord,
}

/// A candidate paired with its cross-encoder relevance score.
///
/// The score comes from the reranker, not the index. The index's raw
/// inner-product similarity lives on a different scale and is dropped once
/// candidates are handed to the reranker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub score: f32,
    pub candidate: Candidate,
}

/// Outcome of answer selection for one query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerResponse {
    /// The index produced no valid candidates at all.
    NoMatch,
    /// Candidates exist but the best relevance score fell short of the
    /// answer threshold; the system declines rather than guessing.
    BelowThreshold { top_score: f32 },
    /// A confident answer, with lower-ranked records offered as suggestions.
    Answer {
        primary: QaRecord,
        suggestions: Vec<QaRecord>,
    },
}

/// One answered exchange in a session's conversation log.
///
/// Turns are appended only after a successful answer; refusals and rejected
/// inputs never become history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub query: String,
    pub answer: String,
    pub asked_at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rerank_text_joins_with_space() {
        let record = QaRecord::new("Where is the lab?", "Second floor, CS block.");
        assert_eq!(record.rerank_text(), "Where is the lab? Second floor, CS block.");
    }

    #[test]
    fn test_answer_response_serde_tagging() {
        let resp = AnswerResponse::BelowThreshold { top_score: 0.3 };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"kind\":\"below_threshold\""));

        let back: AnswerResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_answer_response_answer_roundtrip() {
        let resp = AnswerResponse::Answer {
            primary: QaRecord::new("q", "a"),
            suggestions: vec![QaRecord::new("q2", "a2")],
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: AnswerResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }

    #[test]
    fn test_conversation_turn_new() {
        let turn = ConversationTurn::new("who runs the lab", "Dr. Example");
        assert_eq!(turn.query, "who runs the lab");
        assert_eq!(turn.answer, "Dr. Example");
    }
}
