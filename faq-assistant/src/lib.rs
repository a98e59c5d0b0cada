//! FAQ answering pipeline with a single entry point.
//!
//! Public API: [`FaqAssistant::answer`]. It checks that the model is ready,
//! matches the question against the FAQ keywords, short-circuits small talk
//! and misses to fixed replies, builds a grounded prompt from at most two
//! entries, calls the generator once and cleans the output.
//!
//! Every outcome is a user-facing string. Generation errors are logged and
//! replaced by [`replies::GENERATION_FAILED`]; they never propagate.

pub mod cleaner;
pub mod matcher;
pub mod prompt;
pub mod replies;
pub mod store;

mod error;

pub use error::FaqLoadError;

use std::{sync::Arc, time::Instant};

use ai_llm_service::{generator::TextGenerator, model_slot::ModelSlot};
use tracing::{debug, error, info, instrument};

use matcher::MatchOutcome;
use store::FaqStore;

/// Application-level answerer: the FAQ table plus the model slot.
///
/// Cheap to clone; both halves are shared.
#[derive(Clone)]
pub struct FaqAssistant {
    store: Arc<FaqStore>,
    model: Arc<ModelSlot>,
}

impl FaqAssistant {
    pub fn new(store: Arc<FaqStore>, model: Arc<ModelSlot>) -> Self {
        Self { store, model }
    }

    pub fn store(&self) -> &FaqStore {
        &self.store
    }

    pub fn model(&self) -> &Arc<ModelSlot> {
        &self.model
    }

    /// Answers a (non-empty, trimmed) user question.
    ///
    /// Returns [`replies::MODEL_NOT_LOADED`] until the model is ready,
    /// before any matching happens.
    pub async fn answer(&self, question: &str) -> String {
        let Some(generator) = self.model.generator().await else {
            info!("model not ready; replying with fixed message");
            return replies::MODEL_NOT_LOADED.to_string();
        };
        answer_with(&self.store, generator.as_ref(), question).await
    }
}

/// Runs matching, prompting, generation and cleanup against `generator`.
#[instrument(skip_all, fields(question = %question))]
pub async fn answer_with(store: &FaqStore, generator: &dyn TextGenerator, question: &str) -> String {
    let matches = match matcher::match_query(question, store) {
        MatchOutcome::Greeting => {
            debug!("small talk; greeting");
            return replies::GREETING.to_string();
        }
        MatchOutcome::NoMatch => {
            debug!("no FAQ keyword matched");
            return replies::NO_MATCH.to_string();
        }
        MatchOutcome::Matched(matches) => matches,
    };

    let prompt = prompt::build_prompt(question, &matches);
    info!(
        matched = matches.len(),
        prompt_chars = prompt.chars().count(),
        "generating answer"
    );

    let started = Instant::now();
    match generator.generate(&prompt).await {
        Ok(raw) => {
            let answer = cleaner::clean(&raw);
            info!(
                elapsed_ms = started.elapsed().as_millis(),
                preview = %answer.chars().take(80).collect::<String>(),
                "answer ready"
            );
            answer
        }
        Err(err) => {
            error!(error = %err, "generation failed");
            replies::GENERATION_FAILED.to_string()
        }
    }
}
