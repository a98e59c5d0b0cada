//! Lightweight Ollama client for deterministic text generation.
//!
//! This module implements a thin client for the local Ollama API:
//! - `GET  {endpoint}/api/tags`     — readiness probe (model must be pulled)
//! - `POST {endpoint}/api/generate` — non-streaming raw completion
//!
//! Requests use `raw = true` so Ollama does not wrap the prompt in a chat
//! template, plus `temperature = 0` for greedy decoding.
//!
//! # Examples
//!
//! ```no_run
//! use ai_llm_service::config::generation_config::GenerationConfig;
//! use ai_llm_service::generator::TextGenerator;
//! use ai_llm_service::services::ollama_service::OllamaService;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = OllamaService::new(
//!     "http://localhost:11434",
//!     "tinyllama",
//!     Some(120),
//!     GenerationConfig::default(),
//! )?;
//! svc.probe().await?;
//! let text = svc.generate("Pertanyaan: Jam berapa kantor buka?\nJawaban:").await?;
//! println!("{text}");
//! # Ok(()) }
//! ```

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{
    config::generation_config::GenerationConfig,
    error_handler::{GenerationError, make_snippet},
    generator::{GenerationFuture, TextGenerator},
};

/// Thin client for Ollama.
///
/// Reuses one HTTP client with the configured timeout.
pub struct OllamaService {
    client: reqwest::Client,
    model: String,
    generation: GenerationConfig,
    url_generate: String,
    url_tags: String,
}

impl OllamaService {
    /// Creates a new client.
    ///
    /// # Errors
    /// - [`GenerationError::Decode`] if `endpoint` is empty or lacks http/https
    /// - [`GenerationError::Transport`] if the HTTP client cannot be built
    pub fn new(
        endpoint: &str,
        model: &str,
        timeout_secs: Option<u64>,
        generation: GenerationConfig,
    ) -> Result<Self, GenerationError> {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(GenerationError::Decode(format!(
                "invalid Ollama endpoint: {endpoint:?}"
            )));
        }

        let timeout = Duration::from_secs(timeout_secs.unwrap_or(120));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .brotli(true)
            .build()?;

        let base = endpoint.trim_end_matches('/');
        Ok(Self {
            client,
            model: model.to_string(),
            generation,
            url_generate: format!("{base}/api/generate"),
            url_tags: format!("{base}/api/tags"),
        })
    }

    /// Checks that Ollama answers and that the model has been pulled.
    ///
    /// A tag `name` matches when it equals the configured model or the
    /// model plus a `:tag` suffix (`tinyllama` matches `tinyllama:latest`).
    ///
    /// # Errors
    /// - [`GenerationError::Transport`] when Ollama is unreachable
    /// - [`GenerationError::HttpStatus`] for non-2xx responses
    /// - [`GenerationError::ModelUnavailable`] when the model is not listed
    #[instrument(skip_all, fields(model = %self.model))]
    pub async fn probe(&self) -> Result<(), GenerationError> {
        let started = Instant::now();
        debug!("GET {}", self.url_tags);
        let resp = self.client.get(&self.url_tags).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::HttpStatus {
                status,
                url: self.url_tags.clone(),
                snippet: make_snippet(&text),
            });
        }

        let tags: TagsResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::Decode(format!("serde error: {e}; in /api/tags")))?;

        if !tags.has_model(&self.model) {
            return Err(GenerationError::ModelUnavailable(format!(
                "{} (run `ollama pull {}`)",
                self.model, self.model
            )));
        }

        info!(
            latency_ms = started.elapsed().as_millis(),
            "ollama is up; model is available"
        );
        Ok(())
    }

    #[instrument(skip_all, fields(model = %self.model, prompt_chars = prompt.chars().count()))]
    async fn generate_raw(&self, prompt: &str) -> Result<String, GenerationError> {
        let started = Instant::now();
        let body = GenerateRequest::new(&self.model, prompt, &self.generation);

        debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::HttpStatus {
                status,
                url: self.url_generate.clone(),
                snippet: make_snippet(&text),
            });
        }

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            GenerationError::Decode(format!("serde error: {e}; ensure `stream=false` is used"))
        })?;

        debug!(
            elapsed_ms = started.elapsed().as_millis(),
            "ollama generation finished"
        );
        Ok(out.response)
    }
}

impl TextGenerator for OllamaService {
    fn generate<'a>(&'a self, prompt: &'a str) -> GenerationFuture<'a> {
        Box::pin(self.generate_raw(prompt))
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    raw: bool,
    options: GenerateOptions,
}

impl<'a> GenerateRequest<'a> {
    fn new(model: &'a str, prompt: &'a str, generation: &GenerationConfig) -> Self {
        Self {
            model,
            prompt,
            stream: false,
            raw: true,
            options: GenerateOptions {
                temperature: 0.0,
                repeat_penalty: generation.repetition_penalty,
                num_predict: generation.max_new_tokens,
            },
        }
    }
}

/// Subset of Ollama `options` matching [`GenerationConfig`].
#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    repeat_penalty: f32,
    num_predict: u32,
}

/// Response body for `/api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Response body for `/api/tags`.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

impl TagsResponse {
    fn has_model(&self, model: &str) -> bool {
        self.models.iter().any(|tag| {
            tag.name == model
                || tag
                    .name
                    .strip_prefix(model)
                    .is_some_and(|rest| rest.starts_with(':'))
        })
    }
}
