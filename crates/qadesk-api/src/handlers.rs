//! Route handler functions for all API endpoints.
//!
//! Each handler extracts parameters via axum extractors, calls into the
//! chat responder, and returns JSON responses.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use qadesk_chat::{ChatReply, ReplyKind};
use qadesk_core::types::{ConversationTurn, QaRecord};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    pub kind: ReplyKind,
    pub text: String,
    pub suggestions: Vec<QaRecord>,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub turns: Vec<ConversationTurn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

// =============================================================================
// Handlers
// =============================================================================

/// POST /ask - answer a question, creating or reusing a session.
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    tracing::debug!(query_len = req.query.len(), session = ?req.session_id, "ask received");

    let (reply, session_id) = state
        .responder
        .handle_message(&req.query, req.session_id)
        .await?;

    let ChatReply {
        kind,
        text,
        suggestions,
    } = reply;

    Ok(Json(AskResponse {
        kind,
        text,
        suggestions,
        session_id,
    }))
}

/// GET /history/{session_id} - logged turns for a session, oldest first.
pub async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.responder.get_history(session_id)?;
    Ok(Json(HistoryResponse { session_id, turns }))
}

/// GET /health - liveness and uptime.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
