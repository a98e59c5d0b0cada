//! Text generation for the FAQ chat backend.
//!
//! - [`generator::TextGenerator`] is the capability the request path depends on.
//! - [`model_slot::ModelSlot`] holds the process-wide generator and its
//!   `Uninitialized → Loading → Ready | Failed` lifecycle.
//! - Backends: in-process Llama via candle, or a local Ollama runtime.
//! - Decoding is always greedy with a fixed repetition penalty and token cap
//!   ([`config::generation_config::GenerationConfig`]).

pub mod config {
    pub mod default_config;
    pub mod generation_config;
    pub mod llm_model_config;
    pub mod llm_provider;
}

pub mod services {
    pub mod candle_llama_service;
    pub mod ollama_service;
}

pub mod error_handler;
pub mod generator;
pub mod model_slot;
pub mod telemetry;
