//! Composer configuration

use serde::{Deserialize, Serialize};

use crate::error::ComposeError;

/// Maximum answer length accepted by the input field
pub const DEFAULT_MAX_ANSWER_CHARS: usize = 500;

/// Settings for [`AnswerComposer`](crate::composer::AnswerComposer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    /// Input beyond this many characters is dropped
    pub max_answer_chars: usize,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            max_answer_chars: DEFAULT_MAX_ANSWER_CHARS,
        }
    }
}

impl ComposerConfig {
    pub fn with_max_answer_chars(mut self, max_answer_chars: usize) -> Self {
        self.max_answer_chars = max_answer_chars;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, ComposeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Drop everything past the answer limit
    pub fn clamp_answer(&self, text: &str) -> String {
        text.chars().take(self.max_answer_chars).collect()
    }

    pub fn validate(&self) -> Result<(), ComposeError> {
        if self.max_answer_chars == 0 {
            return Err(ComposeError::InvalidConfig(
                "max_answer_chars must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ComposerConfig::from_json("{}").unwrap();
        assert_eq!(config.max_answer_chars, 500);
    }

    #[test]
    fn test_override() {
        let config = ComposerConfig::from_json(r#"{"max_answer_chars": 140}"#).unwrap();
        assert_eq!(config, ComposerConfig::default().with_max_answer_chars(140));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let result = ComposerConfig::from_json(r#"{"max_answer_chars": 0}"#);
        assert!(matches!(result, Err(ComposeError::InvalidConfig(_))));
    }

    #[test]
    fn test_clamp_answer_counts_characters() {
        let config = ComposerConfig::default().with_max_answer_chars(3);
        assert_eq!(config.clamp_answer("こんにちは"), "こんに");
        assert_eq!(config.clamp_answer("ab"), "ab");
    }

    #[test]
    fn test_invalid_json() {
        let result = ComposerConfig::from_json("not json");
        assert!(matches!(result, Err(ComposeError::JsonError(_))));
    }
}
