//! Error types for the streaming session manager.

use blocktape_backend_audio::AudioError;
use blocktape_backend_music::DeriveError;
use blocktape_spec::BackendError;
use thiserror::Error;

/// Result type for streaming operations.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors raised by the session manager and its collaborators.
#[derive(Debug, Error)]
pub enum StreamError {
    /// `start` was called while a session is already running.
    #[error("already streaming (session {session_id})")]
    AlreadyStreaming {
        /// Id of the running session.
        session_id: String,
    },

    /// The operation needs an active session.
    #[error("no active streaming session")]
    SessionNotActive,

    /// The upstream data source failed.
    #[error("data source error: {0}")]
    DataSource(String),

    /// The snapshot collaborator failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// Playback sink failure.
    #[error("playback error: {0}")]
    Playback(String),

    /// Track generation failed outside derivation and synthesis
    /// (for example a panicked or cancelled render task).
    #[error("generation error: {0}")]
    Generation(String),

    /// Invalid stream configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Parameter derivation failed.
    #[error(transparent)]
    Derive(#[from] DeriveError),

    /// Synthesis or packaging failed.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Configuration or replay file could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError for StreamError {
    fn code(&self) -> &'static str {
        match self {
            StreamError::AlreadyStreaming { .. } => "STREAM_001",
            StreamError::SessionNotActive => "STREAM_002",
            StreamError::DataSource(_) => "STREAM_003",
            StreamError::Archive(_) => "STREAM_004",
            StreamError::Playback(_) => "STREAM_005",
            StreamError::Generation(_) => "STREAM_006",
            StreamError::Config(_) => "STREAM_007",
            StreamError::Derive(e) => e.code(),
            StreamError::Audio(e) => e.code(),
            StreamError::Json(_) => "STREAM_008",
            StreamError::Io(_) => "STREAM_009",
        }
    }

    fn category(&self) -> &'static str {
        match self {
            StreamError::Derive(e) => e.category(),
            StreamError::Audio(e) => e.category(),
            _ => "stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        let err = StreamError::AlreadyStreaming {
            session_id: "abc".to_string(),
        };
        assert_eq!(err.code(), "STREAM_001");
        assert!(err.to_string().contains("abc"));
        assert_eq!(StreamError::SessionNotActive.category(), "stream");
    }

    #[test]
    fn test_wrapped_codes_pass_through() {
        let err: StreamError = AudioError::EmptyArtifact.into();
        assert_eq!(err.code(), "AUDIO_001");
        assert_eq!(err.category(), "audio");
    }
}
