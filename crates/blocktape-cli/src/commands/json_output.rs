//! JSON output types for machine-readable CLI output (`--json`).

use blocktape_backend_audio::WavInfo;
use blocktape_spec::GenerationError;
use serde::Serialize;

/// Error codes for CLI operations.
///
/// Backend errors pass through their own codes (`MUSIC_001`, `AUDIO_003`, ...).
pub mod error_codes {
    /// Event file could not be read or parsed
    pub const INPUT: &str = "CLI_001";
    /// Output could not be written
    pub const OUTPUT: &str = "CLI_002";
    /// WAVE file could not be read
    pub const FILE_READ: &str = "CLI_003";
    /// Generation failed outside a backend
    pub const GENERATION_ERROR: &str = "CLI_010";
}

/// A structured error in JSON output.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct JsonError {
    /// Stable error code
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Backend category ("music", "audio") for backend failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl JsonError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category: None,
        }
    }

    /// Reports a backend failure under its own code and category.
    pub fn from_generation(err: &GenerationError) -> Self {
        Self {
            code: err.code.to_string(),
            message: err.message.clone(),
            category: Some(err.category.to_string()),
        }
    }
}

/// JSON output for the `generate` command.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<GenerateResult>,
    /// BLAKE3 hash of the event file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_hash: Option<String>,
}

/// Details of a generated track.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateResult {
    pub track_id: String,
    pub wav_path: String,
    pub metadata_path: String,
    pub duration_seconds: f64,
    pub tempo: f64,
    pub key: String,
    pub scale: String,
    pub time_bucket: u64,
    pub params_hash: String,
    pub pcm_hash: String,
    pub preview: bool,
    pub duration_ms: u64,
}

/// JSON output for the `inspect` command.
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutput {
    pub success: bool,
    pub errors: Vec<JsonError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<InspectResult>,
}

/// Header fields and payload hash of an inspected file.
#[derive(Debug, Clone, Serialize)]
pub struct InspectResult {
    pub path: String,
    #[serde(flatten)]
    pub info: WavInfo,
    pub duration_seconds: f64,
    pub pcm_hash: String,
}
