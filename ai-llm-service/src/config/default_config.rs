//! Generation backend config loaded from environment variables.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`           = `candle` (default) or `ollama`
//! - `LLM_MAX_TOKENS`     = max new tokens (default 100, 1..=512)
//! - `LLM_REPEAT_PENALTY` = repetition penalty (default 1.1, 1.0..=2.0)
//!
//! Candle-specific:
//! - `MODEL_DIR`   = checkpoint directory (default `models/TinyLlama-1.1B-Chat-v1.0`)
//! - `HF_MODEL_ID` = Hub repo fetched into the local HF cache when `MODEL_DIR`
//!   does not exist (default `TinyLlama/TinyLlama-1.1B-Chat-v1.0`)
//!
//! Ollama-specific:
//! - `OLLAMA_URL` or `OLLAMA_PORT` = endpoint (default `http://localhost:11434`)
//! - `OLLAMA_MODEL`                = model tag (default `tinyllama`)
//! - `LLM_TIMEOUT_SECS`            = HTTP timeout (default 120)

use std::path::PathBuf;

use crate::{
    config::{
        generation_config::GenerationConfig, llm_model_config::LlmModelConfig,
        llm_provider::LlmProvider,
    },
    error_handler::{ConfigError, Result, parse_f32, parse_u32, validate_http_endpoint},
};

/// Default checkpoint directory for the candle backend.
pub const DEFAULT_MODEL_DIR: &str = "models/TinyLlama-1.1B-Chat-v1.0";

/// Default Hugging Face Hub repo for the candle backend.
pub const DEFAULT_HF_MODEL_ID: &str = "TinyLlama/TinyLlama-1.1B-Chat-v1.0";

/// Default Ollama model tag.
pub const DEFAULT_OLLAMA_MODEL: &str = "tinyllama";

const DEFAULT_OLLAMA_PORT: &str = "11434";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Builds the backend config from the process environment.
///
/// # Errors
/// Any [`ConfigError`] from parsing or validation.
pub fn config_from_env() -> Result<LlmModelConfig> {
    config_from_lookup(|key| std::env::var(key).ok())
}

/// Builds the backend config from an arbitrary key lookup.
///
/// Empty values are treated as unset.
///
/// # Errors
/// Any [`ConfigError`] from parsing or validation.
pub fn config_from_lookup<F>(lookup: F) -> Result<LlmModelConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let provider = match get("LLM_KIND") {
        Some(kind) => kind.parse::<LlmProvider>()?,
        None => LlmProvider::default(),
    };

    let mut generation = GenerationConfig::default();
    if let Some(raw) = get("LLM_MAX_TOKENS") {
        generation.max_new_tokens = parse_u32("LLM_MAX_TOKENS", &raw)?;
    }
    if let Some(raw) = get("LLM_REPEAT_PENALTY") {
        generation.repetition_penalty = parse_f32("LLM_REPEAT_PENALTY", &raw)?;
    }
    generation.validate()?;

    match provider {
        LlmProvider::Candle => {
            let model_dir =
                PathBuf::from(get("MODEL_DIR").unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string()));
            let model = model_dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string());

            Ok(LlmModelConfig {
                provider,
                model,
                endpoint: None,
                model_dir: Some(model_dir),
                hf_model_id: Some(
                    get("HF_MODEL_ID")
                        .map(|id| id.trim().to_string())
                        .unwrap_or_else(|| DEFAULT_HF_MODEL_ID.to_string()),
                ),
                timeout_secs: None,
                generation,
            })
        }
        LlmProvider::Ollama => {
            let endpoint = ollama_endpoint(&get)?;
            let model = get("OLLAMA_MODEL").unwrap_or_else(|| DEFAULT_OLLAMA_MODEL.to_string());
            let timeout_secs = match get("LLM_TIMEOUT_SECS") {
                Some(raw) => u64::from(parse_u32("LLM_TIMEOUT_SECS", &raw)?),
                None => DEFAULT_TIMEOUT_SECS,
            };

            Ok(LlmModelConfig {
                provider,
                model,
                endpoint: Some(endpoint),
                model_dir: None,
                hf_model_id: None,
                timeout_secs: Some(timeout_secs),
                generation,
            })
        }
    }
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
fn ollama_endpoint<G>(get: &G) -> Result<String>
where
    G: Fn(&str) -> Option<String>,
{
    if let Some(url) = get("OLLAMA_URL") {
        validate_http_endpoint("OLLAMA_URL", &url)?;
        return Ok(url.trim().trim_end_matches('/').to_string());
    }
    let port = get("OLLAMA_PORT").unwrap_or_else(|| DEFAULT_OLLAMA_PORT.to_string());
    port.trim()
        .parse::<u16>()
        .map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
    Ok(format!("http://localhost:{}", port.trim()))
}
