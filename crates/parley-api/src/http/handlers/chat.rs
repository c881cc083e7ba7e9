//! Chat turn handler.
//!
//! POST /api/chat with `{"session_id", "message"}`. Missing fields are a
//! validation error rather than a body rejection, so they are optional here
//! and checked by the chat service.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::http::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = payload?;
    let reply = state
        .chat_service
        .chat(request.session_id.as_deref(), request.message.as_deref())
        .await?;
    Ok(Json(ChatResponse { reply }))
}
