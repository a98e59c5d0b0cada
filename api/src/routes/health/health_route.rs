use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;

use crate::core::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model: String,
    pub model_loaded: bool,
}

/// Handler: GET /api/health
///
/// Always 200; `model_loaded` is `false` while the model loads or after a
/// failed load.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        model: state.model_display_name.clone(),
        model_loaded: state.assistant.model().is_ready().await,
    })
}
