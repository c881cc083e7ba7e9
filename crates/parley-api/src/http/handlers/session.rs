//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/new_session           - Create an untitled session
//! - GET  /api/sessions              - List sessions, newest first
//! - POST /api/rename_session        - Set a session title
//! - POST /api/delete_session        - Delete a session and its messages
//! - GET  /api/history/{session_id}  - Ordered `{role, content}` history

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use parley_types::chat::{HistoryEntry, SessionId, SessionSummary};

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NewSessionResponse {
    pub session_id: SessionId,
}

#[derive(Debug, Deserialize)]
pub struct RenameSessionRequest {
    pub session_id: SessionId,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteSessionRequest {
    pub session_id: SessionId,
}

/// Acknowledgement body for mutations that return nothing else.
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

/// POST /api/new_session
pub async fn new_session(
    State(state): State<AppState>,
) -> Result<Json<NewSessionResponse>, AppError> {
    let session = state.chat_service.create_session().await?;
    Ok(Json(NewSessionResponse {
        session_id: session.id,
    }))
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    Ok(Json(state.chat_service.list_sessions().await?))
}

/// POST /api/rename_session
///
/// Renaming an unknown session succeeds without effect.
pub async fn rename_session(
    State(state): State<AppState>,
    payload: Result<Json<RenameSessionRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(request) = payload?;
    state
        .chat_service
        .rename_session(&request.session_id, &request.title)
        .await?;
    Ok(OkResponse::ok())
}

/// POST /api/delete_session
pub async fn delete_session(
    State(state): State<AppState>,
    payload: Result<Json<DeleteSessionRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(request) = payload?;
    state.chat_service.delete_session(&request.session_id).await?;
    Ok(OkResponse::ok())
}

/// GET /api/history/{session_id}
///
/// Unknown sessions yield an empty list.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let history = state
        .chat_service
        .get_history(&SessionId::from(session_id))
        .await?;
    Ok(Json(history))
}
