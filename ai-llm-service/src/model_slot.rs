//! Load-once holder for the process-wide text generator.
//!
//! Lifecycle: `Uninitialized → Loading → Ready` on success, or
//! `Loading → Failed` if the load errors. There is no way back: a failed
//! model stays failed until the process restarts.
//!
//! Construct once, wrap in `Arc`, share with request handlers. Handlers ask
//! [`ModelSlot::generator`] and short-circuit when it returns `None`.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::GenerationError,
    generator::TextGenerator,
    services::{candle_llama_service::CandleLlamaService, ollama_service::OllamaService},
};

/// Current state of the model.
#[derive(Clone, Default)]
pub enum ModelState {
    /// Nothing attempted yet.
    #[default]
    Uninitialized,
    /// Load in progress.
    Loading,
    /// Model is usable.
    Ready(Arc<dyn TextGenerator>),
    /// Load failed; carries the reason for diagnostics.
    Failed(String),
}

impl ModelState {
    /// Short lowercase label for logs and health output.
    pub fn label(&self) -> &'static str {
        match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Loading => "loading",
            ModelState::Ready(_) => "ready",
            ModelState::Failed(_) => "failed",
        }
    }
}

impl std::fmt::Debug for ModelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelState::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
            other => f.write_str(other.label()),
        }
    }
}

/// Shared, load-once slot for the generator.
#[derive(Default)]
pub struct ModelSlot {
    state: RwLock<ModelState>,
}

impl ModelSlot {
    /// Creates an empty slot (`Uninitialized`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot that is already `Ready` with `generator`.
    pub fn ready(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            state: RwLock::new(ModelState::Ready(generator)),
        }
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> ModelState {
        self.state.read().await.clone()
    }

    /// `true` once the model is `Ready`.
    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.read().await, ModelState::Ready(_))
    }

    /// The generator, if the model is `Ready`.
    pub async fn generator(&self) -> Option<Arc<dyn TextGenerator>> {
        match &*self.state.read().await {
            ModelState::Ready(generator) => Some(Arc::clone(generator)),
            _ => None,
        }
    }

    /// Runs `load` once and records the outcome.
    ///
    /// Returns `false` without calling `load` if a load was already started.
    pub async fn load_with<F, Fut>(&self, load: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn TextGenerator>, GenerationError>>,
    {
        {
            let mut state = self.state.write().await;
            if !matches!(*state, ModelState::Uninitialized) {
                warn!(state = state.label(), "model load requested twice; ignoring");
                return false;
            }
            *state = ModelState::Loading;
        }

        let outcome = load().await;

        let mut state = self.state.write().await;
        match outcome {
            Ok(generator) => {
                *state = ModelState::Ready(generator);
                info!("model ready");
                true
            }
            Err(err) => {
                error!(error = %err, "model failed to load; chat will reply with a fixed message");
                *state = ModelState::Failed(err.to_string());
                false
            }
        }
    }

    /// Loads the backend described by `cfg` into this slot.
    ///
    /// Candle weights are read (or first downloaded from the hub) on the
    /// blocking pool; Ollama is probed once.
    pub async fn load_from_config(&self, cfg: &LlmModelConfig) -> bool {
        info!(provider = ?cfg.provider, model = %cfg.model, "loading model");
        self.load_with(|| build_generator(cfg.clone())).await
    }
}

async fn build_generator(cfg: LlmModelConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match cfg.provider {
        LlmProvider::Candle => {
            let LlmModelConfig {
                model_dir,
                hf_model_id,
                generation,
                ..
            } = cfg;
            let service = tokio::task::spawn_blocking(move || {
                CandleLlamaService::load_from(model_dir.as_deref(), hf_model_id.as_deref(), generation)
            })
            .await
            .map_err(|e| GenerationError::Worker(e.to_string()))??;
            Ok(Arc::new(service))
        }
        LlmProvider::Ollama => {
            let endpoint = cfg
                .endpoint
                .ok_or_else(|| GenerationError::Decode("missing Ollama endpoint".into()))?;
            let service =
                OllamaService::new(&endpoint, &cfg.model, cfg.timeout_secs, cfg.generation)?;
            service.probe().await?;
            Ok(Arc::new(service))
        }
    }
}
