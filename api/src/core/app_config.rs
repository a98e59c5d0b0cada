//! Process configuration read once at startup.
//!
//! - `API_ADDRESS`        = bind address (default `127.0.0.1:5000`)
//! - `FAQ_PATH`           = FAQ JSON file (default `faq_data.json`)
//! - `MODEL_DISPLAY_NAME` = `model` field in responses (default `TinyLlama-1.1B-Chat`)
//!
//! Generation backend variables are documented in
//! [`ai_llm_service::config::default_config`].

use std::path::PathBuf;

use ai_llm_service::config::{default_config::config_from_lookup, llm_model_config::LlmModelConfig};

use crate::error_handler::AppResult;

pub const DEFAULT_API_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_FAQ_PATH: &str = "faq_data.json";
pub const DEFAULT_MODEL_DISPLAY_NAME: &str = "TinyLlama-1.1B-Chat";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_address: String,
    pub faq_path: PathBuf,
    pub model_display_name: String,
    pub llm: LlmModelConfig,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            api_address: get("API_ADDRESS", DEFAULT_API_ADDRESS),
            faq_path: PathBuf::from(get("FAQ_PATH", DEFAULT_FAQ_PATH)),
            model_display_name: get("MODEL_DISPLAY_NAME", DEFAULT_MODEL_DISPLAY_NAME),
            llm: config_from_lookup(&lookup)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use ai_llm_service::config::llm_provider::LlmProvider;

    use super::*;
    use crate::error_handler::AppError;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.api_address, "127.0.0.1:5000");
        assert_eq!(cfg.faq_path, PathBuf::from("faq_data.json"));
        assert_eq!(cfg.model_display_name, "TinyLlama-1.1B-Chat");
        assert_eq!(cfg.llm.provider, LlmProvider::Candle);
    }

    #[test]
    fn overrides_and_blank_values() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("API_ADDRESS", "0.0.0.0:8080"),
            ("FAQ_PATH", "  "),
            ("MODEL_DISPLAY_NAME", "tinyllama"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_address, "0.0.0.0:8080");
        assert_eq!(cfg.faq_path, PathBuf::from(DEFAULT_FAQ_PATH));
        assert_eq!(cfg.model_display_name, "tinyllama");
    }

    #[test]
    fn invalid_llm_settings_are_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("LLM_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
