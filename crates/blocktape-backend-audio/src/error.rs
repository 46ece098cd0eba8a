//! Error types for audio backend.

use blocktape_spec::BackendError;
use thiserror::Error;

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors that can occur during synthesis, container handling, or packaging.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The synthesized buffer has no samples.
    #[error("synthesized buffer is empty")]
    EmptyArtifact,

    /// Invalid configuration or parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: String,
        /// Error message.
        message: String,
    },

    /// The bytes are not a RIFF/WAVE container this crate can read.
    #[error("invalid WAV container: {0}")]
    InvalidContainer(String),

    /// Metadata or provenance could not be serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AudioError {
    /// Creates an invalid parameter error.
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<blocktape_spec::SpecError> for AudioError {
    fn from(err: blocktape_spec::SpecError) -> Self {
        match err {
            blocktape_spec::SpecError::JsonParse(e) => AudioError::Serialization(e),
            blocktape_spec::SpecError::Io(e) => AudioError::Io(e),
            other => AudioError::invalid_param("spec", other.to_string()),
        }
    }
}

impl BackendError for AudioError {
    fn code(&self) -> &'static str {
        match self {
            AudioError::EmptyArtifact => "AUDIO_001",
            AudioError::InvalidParameter { .. } => "AUDIO_002",
            AudioError::InvalidContainer(_) => "AUDIO_003",
            AudioError::Serialization(_) => "AUDIO_004",
            AudioError::Io(_) => "AUDIO_005",
        }
    }

    fn category(&self) -> &'static str {
        "audio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_helper() {
        let err = AudioError::invalid_param("sample_rate", "must be 44100");
        assert!(err.to_string().contains("sample_rate"));
        assert!(err.to_string().contains("must be 44100"));
        assert_eq!(err.code(), "AUDIO_002");
    }

    #[test]
    fn test_empty_artifact_code() {
        assert_eq!(AudioError::EmptyArtifact.code(), "AUDIO_001");
        assert_eq!(AudioError::EmptyArtifact.category(), "audio");
    }
}
