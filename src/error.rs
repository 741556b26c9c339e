//! Error types for compose-flux

use thiserror::Error;

/// Errors raised around the tracker (the tracker itself never fails)
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Failed to parse event log: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Answer text is empty")]
    EmptyAnswer,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
