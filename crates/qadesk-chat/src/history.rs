//! Session-scoped conversation log and history-request handling.
//!
//! The log is ordered and append-only: a turn is recorded only when the
//! query actually produced an answer (greetings included). Refusals and
//! rejected inputs never become history.

use chrono::{DateTime, Utc};

use qadesk_core::types::ConversationTurn;

/// Append-only log of answered exchanges for one session.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
    last_active: DateTime<Utc>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_active: Utc::now(),
        }
    }

    /// Record an answered exchange and refresh the activity timestamp.
    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
        self.last_active = Utc::now();
    }

    /// Mark the session active without recording a turn (e.g. refusals).
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::new()
    }
}

/// True if the query is asking to see past conversation turns.
pub fn is_history_request(query: &str) -> bool {
    let lower = query.to_lowercase();
    lower.contains("history") || lower.contains("last")
}

/// Render the most recent turns of a log, newest last, 1-based numbering.
pub fn render_history(log: &ConversationLog, limit: usize) -> String {
    if log.is_empty() {
        return "No conversation history yet.".to_string();
    }

    let turns = log.turns();
    let n = turns.len().min(limit);
    let recent = &turns[turns.len() - n..];

    recent
        .iter()
        .enumerate()
        .map(|(i, turn)| format!("{}. Q: {}\n   A: {}", i + 1, turn.query, turn.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}
