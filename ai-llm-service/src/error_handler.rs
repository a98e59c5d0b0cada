//! Errors for `ai-llm-service`.
//!
//! [`AiLlmError`] wraps the two failure domains: [`ConfigError`] (startup,
//! fatal) and [`GenerationError`] (model load and inference, never shown to
//! chat clients). The env parse/validate helpers return [`Result<T>`].
//!
//! Every message is prefixed with `[AI LLM Service]` so log lines can be
//! attributed to this crate.

use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Any failure raised by this crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Model loading or inference errors.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// HTTP client could not be built or reach its peer.
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Bad or out-of-range environment settings.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Value is not a number of the expected type.
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        var: &'static str,
        reason: &'static str,
    },

    /// Unsupported provider in `LLM_KIND`.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Endpoint without an http(s) scheme.
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        var: &'static str,
        reason: &'static str,
    },

    /// Decoding knob outside the range the backends accept.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        field: &'static str,
        detail: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Generation errors                                                         */
/* ------------------------------------------------------------------------- */

/// Errors raised while loading a model or running inference.
///
/// Callers in the request path never surface these to clients; they are
/// logged and replaced by a fixed reply.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Tensor/model error from candle.
    #[error("[AI LLM Service] candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Tokenizer failed to load, encode or decode.
    #[error("[AI LLM Service] tokenizer error: {0}")]
    Tokenizer(String),

    /// Model file could not be read.
    #[error("[AI LLM Service] io error: {0}")]
    Io(#[from] std::io::Error),

    /// Model config (or upstream payload) is not valid JSON.
    #[error("[AI LLM Service] json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Model hub download failed (network, auth, unknown repo or file).
    #[error("[AI LLM Service] model hub error: {0}")]
    Hub(String),

    /// A required model artifact is missing from the model directory.
    #[error("[AI LLM Service] missing model file: {0}")]
    MissingModelFile(String),

    /// Non-successful HTTP status from an upstream runtime.
    #[error("[AI LLM Service] HTTP {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body (trimmed).
        snippet: String,
    },

    /// Transport/HTTP client error.
    #[error("[AI LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Unexpected/invalid upstream response.
    #[error("[AI LLM Service] failed to decode response: {0}")]
    Decode(String),

    /// The blocking inference task panicked or was cancelled.
    #[error("[AI LLM Service] inference worker failed: {0}")]
    Worker(String),

    /// The configured model is not available on the upstream runtime.
    #[error("[AI LLM Service] model not available: {0}")]
    ModelUnavailable(String),
}

/// Keeps the first 240 characters of an upstream body for error messages.
pub fn make_snippet(text: &str) -> String {
    text.trim().chars().take(240).collect()
}

/* ------------------------------------------------------------------------- */
/* Parse helpers (return unified `Result<T>`)                                */
/* ------------------------------------------------------------------------- */

pub(crate) fn parse_u32(var: &'static str, raw: &str) -> Result<u32> {
    raw.trim().parse::<u32>().map_err(|_| {
        AiLlmError::from(ConfigError::InvalidNumber {
            var,
            reason: "expected u32",
        })
    })
}

pub(crate) fn parse_f32(var: &'static str, raw: &str) -> Result<f32> {
    raw.trim().parse::<f32>().map_err(|_| {
        AiLlmError::from(ConfigError::InvalidNumber {
            var,
            reason: "expected f32",
        })
    })
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`
/// or not finite.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

/// Validates that an integer value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_u32(field: &'static str, value: u32, min: u32, max: u32) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_requires_http_scheme() {
        assert!(validate_http_endpoint("OLLAMA_URL", "http://localhost:11434").is_ok());
        assert!(validate_http_endpoint("OLLAMA_URL", " https://ollama.internal ").is_ok());

        let err = validate_http_endpoint("OLLAMA_URL", "localhost:11434").unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::InvalidFormat { var: "OLLAMA_URL", .. })
        ));
    }

    #[test]
    fn ranges_are_inclusive() {
        assert!(validate_range_f32("repetition_penalty", 1.0, 1.0, 2.0).is_ok());
        assert!(validate_range_f32("repetition_penalty", 2.0, 1.0, 2.0).is_ok());
        assert!(validate_range_f32("repetition_penalty", 0.9, 1.0, 2.0).is_err());
        assert!(validate_range_f32("repetition_penalty", f32::NAN, 1.0, 2.0).is_err());

        assert!(validate_range_u32("max_new_tokens", 1, 1, 512).is_ok());
        assert!(validate_range_u32("max_new_tokens", 0, 1, 512).is_err());
        assert!(validate_range_u32("max_new_tokens", 513, 1, 512).is_err());
    }

    #[test]
    fn number_parsing_reports_variable() {
        assert_eq!(parse_u32("LLM_MAX_TOKENS", " 150 ").unwrap(), 150);
        assert!((parse_f32("LLM_REPEAT_PENALTY", "1.1").unwrap() - 1.1).abs() < f32::EPSILON);

        let err = parse_u32("LLM_MAX_TOKENS", "many").unwrap_err();
        assert!(err.to_string().contains("LLM_MAX_TOKENS"));
    }

    #[test]
    fn snippet_is_capped() {
        let long = "x".repeat(1000);
        assert_eq!(make_snippet(&long).len(), 240);
        assert_eq!(make_snippet("  short  "), "short");
    }
}
