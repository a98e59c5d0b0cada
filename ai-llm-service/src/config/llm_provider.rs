use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the backend used to run the text-generation model.
///
/// - `Candle` runs a Llama-family checkpoint in-process.
/// - `Ollama` delegates to a local Ollama runtime over HTTP.
///
/// Selected with `LLM_KIND` (`candle` | `ollama`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LlmProvider {
    /// In-process inference via candle.
    #[default]
    Candle,
    /// Local Ollama runtime.
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "candle" | "local" => Ok(LlmProvider::Candle),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_providers() {
        assert_eq!("candle".parse::<LlmProvider>(), Ok(LlmProvider::Candle));
        assert_eq!(" Ollama ".parse::<LlmProvider>(), Ok(LlmProvider::Ollama));
        assert_eq!(
            "chatgpt".parse::<LlmProvider>(),
            Err(ConfigError::UnsupportedProvider("chatgpt".into()))
        );
    }
}
