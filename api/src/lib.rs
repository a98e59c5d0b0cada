use std::sync::Arc;

mod core {
    pub mod app_config;
    pub mod app_state;
}

mod routes {
    pub mod chat {
        pub mod chat_request;
        pub mod chat_route;
    }
    pub mod health {
        pub mod health_route;
    }
}

mod error_handler;

pub use crate::{
    core::{app_config::AppConfig, app_state::AppState},
    error_handler::{AppError, AppResult},
};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

use crate::routes::{chat::chat_route::chat, health::health_route::health};

/// Reads config, binds, starts loading the model and serves until Ctrl+C.
///
/// The model loads in the background after the listener is bound, so the
/// health endpoint answers (with `model_loaded: false`) while it loads.
pub async fn start() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let state = Arc::new(AppState::from_config(&config));

    let listener = tokio::net::TcpListener::bind(&config.api_address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %config.api_address, model = %config.model_display_name, "listening");

    let model = Arc::clone(state.assistant.model());
    let llm = config.llm.clone();
    tokio::spawn(async move {
        model.load_from_config(&llm).await;
    });

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Builds the HTTP router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .with_state(state)
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
