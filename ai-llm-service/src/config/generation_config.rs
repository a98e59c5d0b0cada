//! Fixed decoding parameters shared by every backend.

use crate::error_handler::{Result, validate_range_f32, validate_range_u32};

/// Default cap on newly generated tokens.
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 100;

/// Default repetition penalty (1.0 disables the penalty).
pub const DEFAULT_REPETITION_PENALTY: f32 = 1.1;

/// Process-wide decoding parameters, fixed when the model is loaded.
///
/// Sampling is always disabled: every backend decodes greedily, so the same
/// prompt yields the same continuation for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationConfig {
    /// Upper bound on generated tokens (prompt tokens excluded).
    pub max_new_tokens: u32,
    /// Penalty applied to logits of tokens already present in the context.
    pub repetition_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            repetition_penalty: DEFAULT_REPETITION_PENALTY,
        }
    }
}

impl GenerationConfig {
    /// Checks the knobs against the ranges the backends accept.
    ///
    /// # Errors
    /// [`crate::error_handler::ConfigError::OutOfRange`] for either field.
    pub fn validate(&self) -> Result<()> {
        validate_range_u32("max_new_tokens", self.max_new_tokens, 1, 512)?;
        validate_range_f32("repetition_penalty", self.repetition_penalty, 1.0, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.max_new_tokens, 100);
        assert!((cfg.repetition_penalty - 1.1).abs() < f32::EPSILON);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let zero_tokens = GenerationConfig {
            max_new_tokens: 0,
            ..Default::default()
        };
        assert!(zero_tokens.validate().is_err());

        let reward_repeats = GenerationConfig {
            repetition_penalty: 0.5,
            ..Default::default()
        };
        assert!(reward_repeats.validate().is_err());
    }
}
