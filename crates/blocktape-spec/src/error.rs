//! Error types for event validation and shared backend reporting.

use thiserror::Error;

/// Error codes for source-event batch validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// E001: Batch contains no events
    EmptyBatch,
    /// E002: Events are not ordered most-recent-last
    OutOfOrder,
    /// E003: A numeric field is NaN or infinite
    NonFiniteField,
    /// E004: Cost or flow is negative
    NegativeField,
    /// E005: Stored content hash does not match the event fields
    ContentHashMismatch,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "E001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::EmptyBatch => "E001",
            ErrorCode::OutOfOrder => "E002",
            ErrorCode::NonFiniteField => "E003",
            ErrorCode::NegativeField => "E004",
            ErrorCode::ContentHashMismatch => "E005",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A validation error with code, message, and optional field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error code.
    pub code: ErrorCode,
    /// Human-readable error message.
    pub message: String,
    /// Path to the problematic field (e.g., "events\[3\].cost").
    pub path: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Creates a new validation error with a field path.
    pub fn with_path(code: ErrorCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref path) = self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// Top-level error type for data-model operations.
#[derive(Debug, Error)]
pub enum SpecError {
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of batch validation.
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether validation passed (no errors).
    pub ok: bool,
    /// List of validation errors.
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Creates a successful validation result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    /// Adds an error to the result.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.ok = false;
    }

    /// Returns true if there are no errors.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Joins all error messages into one line, for wrapping into a backend error.
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Common trait for backend errors.
///
/// Each backend error type implements this trait so the CLI and the
/// streaming layer can report failures with a stable code and category
/// without depending on every backend's concrete error enum.
pub trait BackendError: std::error::Error {
    /// Get the error code for reporting.
    ///
    /// Returns a static string like "MUSIC_001" or "AUDIO_002". These codes
    /// are stable and can be matched programmatically.
    fn code(&self) -> &'static str;

    /// Get a human-readable message describing the error.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Get the error category ("music", "audio", "stream").
    fn category(&self) -> &'static str;
}

/// A unified error type that can wrap any backend error.
#[derive(Debug)]
pub struct GenerationError {
    /// The error code (e.g., "MUSIC_001").
    pub code: &'static str,
    /// The human-readable error message.
    pub message: String,
    /// The error category (e.g., "music", "audio").
    pub category: &'static str,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl GenerationError {
    /// Create a `GenerationError` from any `BackendError` implementor.
    pub fn from_backend<E: BackendError + Send + Sync + 'static>(err: E) -> Self {
        Self {
            code: err.code(),
            message: err.message(),
            category: err.category(),
            source: Some(Box::new(err)),
        }
    }
}

impl std::fmt::Display for GenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for GenerationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::EmptyBatch.code(), "E001");
        assert_eq!(ErrorCode::OutOfOrder.code(), "E002");
        assert_eq!(ErrorCode::ContentHashMismatch.code(), "E005");
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new(ErrorCode::EmptyBatch, "batch is empty");
        assert_eq!(err.to_string(), "E001: batch is empty");

        let err_with_path =
            ValidationError::with_path(ErrorCode::NonFiniteField, "cost is NaN", "events[2].cost");
        assert_eq!(
            err_with_path.to_string(),
            "E003: cost is NaN (at events[2].cost)"
        );
    }

    #[test]
    fn test_validation_result_summary() {
        let mut result = ValidationResult::success();
        assert!(result.is_ok());

        result.add_error(ValidationError::new(ErrorCode::EmptyBatch, "empty"));
        result.add_error(ValidationError::new(ErrorCode::OutOfOrder, "unordered"));
        assert!(!result.is_ok());
        assert_eq!(result.summary(), "E001: empty; E002: unordered");
    }

    #[derive(Debug, Error)]
    #[error("boom")]
    struct Boom;

    impl BackendError for Boom {
        fn code(&self) -> &'static str {
            "TEST_001"
        }

        fn category(&self) -> &'static str {
            "test"
        }
    }

    #[test]
    fn test_generation_error_from_backend() {
        let err = GenerationError::from_backend(Boom);
        assert_eq!(err.code, "TEST_001");
        assert_eq!(err.category, "test");
        assert_eq!(err.to_string(), "[TEST_001] boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
