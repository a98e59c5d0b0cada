//! Capability interface for text generation.
//!
//! Implement this trait to plug in a generation backend (local candle model,
//! Ollama, or a deterministic stub in tests).

use std::{future::Future, pin::Pin};

use crate::error_handler::GenerationError;

/// Boxed future returned by [`TextGenerator::generate`].
pub type GenerationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>>;

/// Turns a prompt into a continuation.
///
/// Implementations return only the newly generated text, never the echoed
/// prompt, and decode deterministically.
pub trait TextGenerator: Send + Sync {
    /// Generates a continuation for `prompt`.
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a>;
}
