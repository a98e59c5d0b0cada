//! POST /api/chat — answers one FAQ question.

use std::sync::Arc;

use axum::{Json, extract::State, extract::rejection::JsonRejection};
use tracing::{error, info, instrument};

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    routes::chat::chat_request::{ChatRequest, ChatResponse},
};

/// Handler: POST /api/chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/api/chat \
///   -H 'content-type: application/json' \
///   -d '{"message":"Berapa jam kerja kantor?"}'
/// ```
#[instrument(skip_all)]
pub async fn chat(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> AppResult<Json<ChatResponse>> {
    let Json(body) = payload?;

    let message = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Message required".into()))?
        .to_string();

    info!(chars = message.chars().count(), "chat request");

    // The pipeline runs in its own task so a panic turns into a 500.
    let assistant = state.assistant.clone();
    let response = tokio::spawn(async move { assistant.answer(&message).await })
        .await
        .map_err(|err| {
            error!(error = %err, "chat pipeline task failed");
            AppError::Internal(err.to_string())
        })?;

    Ok(Json(ChatResponse {
        response,
        status: "success",
        model: state.model_display_name.clone(),
    }))
}
