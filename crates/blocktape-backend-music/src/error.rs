//! Error types for parameter derivation.

use blocktape_spec::{BackendError, ValidationResult};
use thiserror::Error;

/// Result type for derivation operations.
pub type DeriveResult<T> = Result<T, DeriveError>;

/// Errors that can occur while deriving music parameters.
#[derive(Debug, Error)]
pub enum DeriveError {
    /// The event batch was empty or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The derivation configuration is inconsistent.
    #[error("invalid configuration '{field}': {message}")]
    InvalidConfig {
        /// Offending field.
        field: &'static str,
        /// Error message.
        message: String,
    },
}

impl DeriveError {
    /// Creates an invalid input error from a failed batch validation.
    pub fn from_validation(result: &ValidationResult) -> Self {
        Self::InvalidInput(result.summary())
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }
}

impl BackendError for DeriveError {
    fn code(&self) -> &'static str {
        match self {
            DeriveError::InvalidInput(_) => "MUSIC_001",
            DeriveError::InvalidConfig { .. } => "MUSIC_002",
        }
    }

    fn category(&self) -> &'static str {
        "music"
    }
}
