//! Chat responder: the boundary between users and the retrieval core.
//!
//! Routes each message through greeting handling, history requests, and
//! input validation before the retrieval pipeline runs, then applies the
//! answer-selection policy and the error downgrade rules: infrastructure
//! failures keep their classification for the operator channel, everything
//! else is logged here and reduced to a generic user message.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;

use qadesk_core::config::QadeskConfig;
use qadesk_core::error::QadeskError;
use qadesk_core::types::{AnswerResponse, ConversationTurn, QaRecord};
use qadesk_retrieval::{ContextLoader, RetrievalPipeline, SelectionPolicy};

use crate::error::ChatError;
use crate::greeting::greeting_response;
use crate::history::{is_history_request, render_history, ConversationLog};
use crate::validate::QueryValidator;

/// What kind of reply the responder produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyKind {
    /// Canned small-talk response.
    Greeting,
    /// Rendered recent conversation history.
    History,
    /// A corpus answer above the confidence threshold.
    Answer,
    /// A refusal: nothing matched, or nothing matched well enough.
    Refusal,
    /// The query failed input validation.
    Invalid,
}

/// A reply produced for one message.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatReply {
    pub kind: ReplyKind,
    pub text: String,
    /// Secondary suggestions; populated only for `Answer` replies.
    pub suggestions: Vec<QaRecord>,
}

impl ChatReply {
    fn plain(kind: ReplyKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            suggestions: Vec::new(),
        }
    }
}

/// Session-keyed conversational front end over the retrieval pipeline.
///
/// The retrieval context, index, and models are all read-only shared state;
/// the one mutable structure is the session map, serialized behind a Mutex
/// here so the core itself never performs concurrent writes.
pub struct ChatResponder {
    loader: Arc<ContextLoader>,
    policy: SelectionPolicy,
    coarse_k: usize,
    rerank_k: usize,
    validator: QueryValidator,
    history_display_limit: usize,
    max_sessions: usize,
    sessions: Mutex<HashMap<Uuid, ConversationLog>>,
}

impl ChatResponder {
    pub fn new(config: &QadeskConfig, loader: Arc<ContextLoader>) -> Self {
        Self {
            loader,
            policy: SelectionPolicy::from_config(&config.retrieval),
            coarse_k: config.retrieval.coarse_k,
            rerank_k: config.retrieval.rerank_k,
            validator: QueryValidator::from_config(&config.chat),
            history_display_limit: config.chat.history_display_limit,
            max_sessions: config.chat.max_sessions,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Handle one incoming message.
    ///
    /// Returns the reply and the session it belongs to (created if the
    /// caller supplied none or an unknown one).
    pub async fn handle_message(
        &self,
        message: &str,
        session_id: Option<Uuid>,
    ) -> Result<(ChatReply, Uuid), ChatError> {
        let query = message.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let sid = self.resolve_session(session_id);

        // Small talk never reaches the pipeline, but it is answered, so it
        // counts as history.
        if let Some(response) = greeting_response(query) {
            debug!(session = %sid, "greeting handled");
            self.append_turn(sid, query, response);
            return Ok((ChatReply::plain(ReplyKind::Greeting, response), sid));
        }

        if is_history_request(query) {
            let text = {
                let sessions = self.lock_sessions();
                let log = sessions.get(&sid).cloned().unwrap_or_default();
                render_history(&log, self.history_display_limit)
            };
            return Ok((ChatReply::plain(ReplyKind::History, text), sid));
        }

        if let Err(rejection) = self.validator.validate(query) {
            debug!(session = %sid, rejection = ?rejection, "query rejected");
            return Ok((
                ChatReply::plain(ReplyKind::Invalid, rejection.user_message()),
                sid,
            ));
        }

        let context = self
            .loader
            .get()
            .await
            .map_err(|e| self.classify(e, "context load"))?;
        let pipeline = RetrievalPipeline::new(context);

        let scored = pipeline
            .retrieve_top_k(query, self.coarse_k, self.rerank_k)
            .await
            .map_err(|e| self.classify(e, "retrieval"))?;

        let reply = match self.policy.select(&scored) {
            AnswerResponse::NoMatch => ChatReply::plain(
                ReplyKind::Refusal,
                "Sorry, I couldn't find an answer to your question.",
            ),
            AnswerResponse::BelowThreshold { top_score } => {
                info!(session = %sid, top_score, "query out of domain");
                ChatReply::plain(
                    ReplyKind::Refusal,
                    "I can only answer questions covered by the knowledge base. \
                     Please ask a related question.",
                )
            }
            AnswerResponse::Answer {
                primary,
                suggestions,
            } => {
                self.append_turn(sid, query, &primary.answer);
                ChatReply {
                    kind: ReplyKind::Answer,
                    text: format_answer(&primary, &suggestions),
                    suggestions,
                }
            }
        };

        Ok((reply, sid))
    }

    /// All logged turns for a session, oldest first.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<ConversationTurn>, ChatError> {
        let sessions = self.lock_sessions();
        sessions
            .get(&session_id)
            .map(|log| log.turns().to_vec())
            .ok_or(ChatError::SessionNotFound(session_id))
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    // -- Private helpers --

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, ConversationLog>> {
        // A poisoned lock means another handler panicked mid-insert; the map
        // itself is still usable for this append-only workload.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the existing session or create one, evicting the least
    /// recently active session when at capacity.
    fn resolve_session(&self, requested: Option<Uuid>) -> Uuid {
        let mut sessions = self.lock_sessions();

        if let Some(sid) = requested {
            if let Some(log) = sessions.get_mut(&sid) {
                log.touch();
                return sid;
            }
        }

        if sessions.len() >= self.max_sessions {
            if let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, log)| log.last_active())
                .map(|(id, _)| *id)
            {
                debug!(session = %oldest, "evicting least recently active session");
                sessions.remove(&oldest);
            }
        }

        let sid = Uuid::new_v4();
        sessions.insert(sid, ConversationLog::new());
        sid
    }

    fn append_turn(&self, session_id: Uuid, query: &str, answer: &str) {
        let mut sessions = self.lock_sessions();
        sessions
            .entry(session_id)
            .or_default()
            .append(ConversationTurn::new(query, answer));
    }

    /// Log a pipeline failure verbatim for operators and convert it for the
    /// caller. Raw detail goes no further than the log.
    fn classify(&self, err: QadeskError, stage: &str) -> ChatError {
        if err.is_infrastructure() {
            error!(stage, error = %err, "retrieval infrastructure failure");
        } else {
            error!(stage, error = %err, "unexpected retrieval failure");
        }
        err.into()
    }
}

/// Render an answer with its suggestions the way the chat surface shows it.
fn format_answer(primary: &QaRecord, suggestions: &[QaRecord]) -> String {
    let mut text = format!("Answer: {}", primary.answer);
    if !suggestions.is_empty() {
        text.push_str("\n\nOther suggestions:");
        for record in suggestions {
            text.push_str(&format!("\n- Q: {}\n  A: {}", record.question, record.answer));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    use qadesk_core::error::QadeskError;
    use qadesk_retrieval::RetrievalContext;
    use qadesk_vector::embedding::EmbeddingService;
    use qadesk_vector::{CorpusStore, MockEmbedding, MockReranker, VectorIndex};

    fn campus_records() -> Vec<QaRecord> {
        vec![
            QaRecord::new(
                "What is the admission deadline?",
                "Applications close in the last week of June.",
            ),
            QaRecord::new(
                "Where is the data mining lab located?",
                "The data mining lab is on the second floor of the CS block.",
            ),
            QaRecord::new(
                "Who supervises the research assistants?",
                "The lab director assigns supervisors each semester.",
            ),
        ]
    }

    async fn responder_for(records: Vec<QaRecord>) -> ChatResponder {
        let embedder = MockEmbedding::new();
        let mut vectors = Vec::with_capacity(records.len());
        for record in &records {
            vectors.push(embedder.embed(&record.question).await.unwrap());
        }
        let dimension = vectors.first().map(Vec::len).unwrap_or(0);

        let loader = ContextLoader::new(move || {
            let records = records.clone();
            let vectors = vectors.clone();
            async move {
                Ok(RetrievalContext::new(
                    Box::new(MockEmbedding::new()),
                    Box::new(MockReranker::new()),
                    VectorIndex::from_vectors(vectors, dimension).unwrap(),
                    CorpusStore::new(records),
                ))
            }
        });

        ChatResponder::new(&QadeskConfig::default(), Arc::new(loader))
    }

    fn failing_responder(err_factory: fn() -> QadeskError) -> ChatResponder {
        let loader = ContextLoader::new(move || async move { Err(err_factory()) });
        ChatResponder::new(&QadeskConfig::default(), Arc::new(loader))
    }

    // ---- Greetings ----

    #[tokio::test]
    async fn test_greeting_reply_and_logged() {
        let responder = responder_for(campus_records()).await;
        let (reply, sid) = responder.handle_message("hello", None).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::Greeting);
        assert!(reply.text.contains("Hello"));

        let history = responder.get_history(sid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].query, "hello");
    }

    // ---- Answers ----

    #[tokio::test]
    async fn test_confident_answer_logged() {
        let responder = responder_for(campus_records()).await;
        let (reply, sid) = responder
            .handle_message("What is the admission deadline?", None)
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::Answer);
        assert!(reply.text.contains("Applications close"));

        let history = responder.get_history(sid).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].answer, "Applications close in the last week of June.");
    }

    #[tokio::test]
    async fn test_out_of_domain_refused_and_not_logged() {
        let responder = responder_for(campus_records()).await;
        let (reply, sid) = responder
            .handle_message("is cafeteria open today", None)
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::Refusal);
        assert!(reply.text.contains("knowledge base"));

        let history = responder.get_history(sid).unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_empty_corpus_is_no_match_refusal() {
        let responder = responder_for(Vec::new()).await;
        let (reply, _) = responder
            .handle_message("where is the registration office", None)
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::Refusal);
        assert!(reply.text.contains("couldn't find an answer"));
    }

    // ---- Validation ----

    #[tokio::test]
    async fn test_empty_message_is_error() {
        let responder = responder_for(campus_records()).await;
        let result = responder.handle_message("   ", None).await;
        assert!(matches!(result, Err(ChatError::EmptyMessage)));
    }

    #[tokio::test]
    async fn test_too_long_query_rejected() {
        let responder = responder_for(campus_records()).await;
        let long = "word ".repeat(201);
        let (reply, _) = responder.handle_message(&long, None).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::Invalid);
        assert!(reply.text.contains("too long"));
    }

    #[tokio::test]
    async fn test_numbers_only_query_rejected() {
        let responder = responder_for(campus_records()).await;
        let (reply, _) = responder.handle_message("123 456", None).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::Invalid);
        assert!(reply.text.contains("only numbers"));
    }

    #[tokio::test]
    async fn test_rejected_query_not_logged() {
        let responder = responder_for(campus_records()).await;
        let (_, sid) = responder.handle_message("??", None).await.unwrap();
        assert!(responder.get_history(sid).unwrap().is_empty());
    }

    // ---- History ----

    #[tokio::test]
    async fn test_history_request_renders_turns() {
        let responder = responder_for(campus_records()).await;
        let (_, sid) = responder
            .handle_message("What is the admission deadline?", None)
            .await
            .unwrap();

        let (reply, _) = responder
            .handle_message("show my history", Some(sid))
            .await
            .unwrap();

        assert_eq!(reply.kind, ReplyKind::History);
        assert!(reply.text.contains("admission deadline"));
    }

    #[tokio::test]
    async fn test_history_request_with_no_turns() {
        let responder = responder_for(campus_records()).await;
        let (reply, _) = responder.handle_message("my history", None).await.unwrap();

        assert_eq!(reply.kind, ReplyKind::History);
        assert!(reply.text.contains("No conversation history"));
    }

    #[tokio::test]
    async fn test_history_request_is_not_logged_as_turn() {
        let responder = responder_for(campus_records()).await;
        let (_, sid) = responder.handle_message("my history", None).await.unwrap();
        assert!(responder.get_history(sid).unwrap().is_empty());
    }

    // ---- Sessions ----

    #[tokio::test]
    async fn test_session_reuse() {
        let responder = responder_for(campus_records()).await;
        let (_, sid1) = responder.handle_message("hello", None).await.unwrap();
        let (_, sid2) = responder.handle_message("thanks", Some(sid1)).await.unwrap();

        assert_eq!(sid1, sid2);
        assert_eq!(responder.get_history(sid1).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_session_creates_new() {
        let responder = responder_for(campus_records()).await;
        let fake = Uuid::new_v4();
        let (_, sid) = responder.handle_message("hello", Some(fake)).await.unwrap();
        assert_ne!(sid, fake);
    }

    #[tokio::test]
    async fn test_get_history_unknown_session() {
        let responder = responder_for(campus_records()).await;
        let result = responder.get_history(Uuid::new_v4());
        assert!(matches!(result, Err(ChatError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn test_session_cap_evicts_least_recently_active() {
        let mut config = QadeskConfig::default();
        config.chat.max_sessions = 2;

        let records = campus_records();
        let embedder = MockEmbedding::new();
        let mut vectors = Vec::new();
        for record in &records {
            vectors.push(embedder.embed(&record.question).await.unwrap());
        }
        let dimension = vectors[0].len();
        let loader = ContextLoader::new(move || {
            let records = records.clone();
            let vectors = vectors.clone();
            async move {
                Ok(RetrievalContext::new(
                    Box::new(MockEmbedding::new()),
                    Box::new(MockReranker::new()),
                    VectorIndex::from_vectors(vectors, dimension).unwrap(),
                    CorpusStore::new(records),
                ))
            }
        });
        let responder = ChatResponder::new(&config, Arc::new(loader));

        responder.handle_message("hello", None).await.unwrap();
        responder.handle_message("hello", None).await.unwrap();
        responder.handle_message("hello", None).await.unwrap();

        assert_eq!(responder.session_count(), 2);
    }

    // ---- Error boundary ----

    #[tokio::test]
    async fn test_missing_artifact_surfaces_as_infrastructure() {
        let responder =
            failing_responder(|| QadeskError::DataNotFound("qa_index.json".to_string()));
        let err = responder
            .handle_message("where is the lab", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Infrastructure(_)));
        assert!(err.user_message().contains("administrator"));
    }

    #[tokio::test]
    async fn test_other_failures_downgrade_to_generic() {
        let responder = failing_responder(|| QadeskError::Inference("tensor blew up".to_string()));
        let err = responder
            .handle_message("where is the lab", None)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Internal(_)));
        assert!(!err.user_message().contains("tensor"));
        assert!(err.user_message().contains("try again"));
    }

    #[tokio::test]
    async fn test_greetings_work_even_when_infrastructure_is_down() {
        // Small talk never touches the pipeline, so a broken index must not
        // break it.
        let responder = failing_responder(|| QadeskError::DataCorrupt("bad".to_string()));
        let (reply, _) = responder.handle_message("hello", None).await.unwrap();
        assert_eq!(reply.kind, ReplyKind::Greeting);
    }

    // ---- Formatting ----

    #[tokio::test]
    async fn test_answer_formatting_includes_suggestions() {
        let primary = QaRecord::new("q1", "main answer");
        let suggestions = vec![QaRecord::new("q2", "second answer")];
        let text = format_answer(&primary, &suggestions);

        assert!(text.starts_with("Answer: main answer"));
        assert!(text.contains("Other suggestions:"));
        assert!(text.contains("Q: q2"));
        assert!(text.contains("A: second answer"));
    }

    #[tokio::test]
    async fn test_answer_formatting_without_suggestions() {
        let primary = QaRecord::new("q1", "main answer");
        let text = format_answer(&primary, &[]);
        assert_eq!(text, "Answer: main answer");
    }
}
