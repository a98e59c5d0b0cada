use std::path::PathBuf;

use crate::config::{generation_config::GenerationConfig, llm_provider::LlmProvider};

/// Configuration for the text-generation backend.
///
/// # Fields
///
/// - `provider`: which backend runs the model.
/// - `model`: model identifier (Ollama tag, or a label for the local checkpoint).
/// - `endpoint`: Ollama base URL; unused by the candle backend.
/// - `model_dir`: directory with `config.json`, `tokenizer.json` and
///   `*.safetensors`; unused by the Ollama backend.
/// - `hf_model_id`: Hugging Face Hub repo fetched (and cached) when
///   `model_dir` does not exist.
/// - `timeout_secs`: HTTP timeout for remote backends.
/// - `generation`: fixed decoding parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The backend (candle or Ollama).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"tinyllama"`).
    pub model: String,

    /// Remote inference endpoint, when the provider needs one.
    pub endpoint: Option<String>,

    /// Local checkpoint directory, when the provider needs one.
    pub model_dir: Option<PathBuf>,

    /// Hub repo id used when `model_dir` is absent on disk.
    pub hf_model_id: Option<String>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,

    /// Decoding parameters.
    pub generation: GenerationConfig,
}
