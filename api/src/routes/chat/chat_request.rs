use serde::{Deserialize, Serialize};

/// Request payload for /api/chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// User question; missing, null and blank are all rejected by the handler.
    #[serde(default)]
    pub message: Option<String>,
}

/// Response payload for /api/chat.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Always `"success"`.
    pub status: &'static str,
    pub model: String,
}
