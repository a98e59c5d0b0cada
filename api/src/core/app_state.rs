use std::sync::Arc;

use ai_llm_service::model_slot::ModelSlot;
use faq_assistant::{FaqAssistant, store::FaqStore};

use crate::core::app_config::AppConfig;

/// Shared state for all HTTP handlers.
///
/// The model slot starts empty; [`crate::start`] fills it in the background.
#[derive(Clone)]
pub struct AppState {
    /// FAQ table plus the model slot.
    pub assistant: FaqAssistant,
    /// Reported as `model` in chat and health responses.
    pub model_display_name: String,
}

impl AppState {
    /// Loads the FAQ file (fail-soft) and creates an empty model slot.
    pub fn from_config(config: &AppConfig) -> Self {
        let store = FaqStore::load(&config.faq_path);
        Self::new(store, ModelSlot::new(), config.model_display_name.clone())
    }

    pub fn new(store: FaqStore, model: ModelSlot, model_display_name: impl Into<String>) -> Self {
        Self {
            assistant: FaqAssistant::new(Arc::new(store), Arc::new(model)),
            model_display_name: model_display_name.into(),
        }
    }
}
