//! Synthesis configuration.

use blocktape_spec::{MAX_DURATION_SECONDS, SAMPLE_RATE};
use serde::{Deserialize, Serialize};

use crate::error::{AudioError, AudioResult};

/// Render settings that are not part of a track's musical parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Output sample rate; the container is fixed at 44100 Hz.
    pub sample_rate: u32,
    /// Upper bound on rendered length; never above 300 s.
    pub max_duration_seconds: f64,
    /// Render only the first N seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_seconds: Option<f64>,
    /// Master switch for the vinyl texture layer.
    pub vinyl_enabled: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            max_duration_seconds: MAX_DURATION_SECONDS,
            preview_seconds: None,
            vinyl_enabled: true,
        }
    }
}

impl SynthConfig {
    /// Default settings truncated to a preview length.
    pub fn preview(seconds: f64) -> Self {
        Self {
            preview_seconds: Some(seconds),
            ..Default::default()
        }
    }

    /// Effective cap for a render: the smallest of 300 s, the configured
    /// maximum, and the preview length.
    pub fn duration_cap(&self) -> f64 {
        let mut cap = self.max_duration_seconds.min(MAX_DURATION_SECONDS);
        if let Some(preview) = self.preview_seconds {
            cap = cap.min(preview);
        }
        cap.max(0.0)
    }

    /// Checks the settings.
    pub fn validate(&self) -> AudioResult<()> {
        if self.sample_rate != SAMPLE_RATE {
            return Err(AudioError::invalid_param(
                "sample_rate",
                format!("must be {}, got {}", SAMPLE_RATE, self.sample_rate),
            ));
        }
        if !self.max_duration_seconds.is_finite() || self.max_duration_seconds <= 0.0 {
            return Err(AudioError::invalid_param(
                "max_duration_seconds",
                format!("must be positive, got {}", self.max_duration_seconds),
            ));
        }
        if let Some(preview) = self.preview_seconds {
            if !preview.is_finite() || preview <= 0.0 {
                return Err(AudioError::invalid_param(
                    "preview_seconds",
                    format!("must be positive, got {}", preview),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_cap() {
        assert_eq!(SynthConfig::default().duration_cap(), 300.0);
        assert_eq!(SynthConfig::preview(5.0).duration_cap(), 5.0);

        let config = SynthConfig {
            max_duration_seconds: 900.0,
            ..Default::default()
        };
        assert_eq!(config.duration_cap(), 300.0);
    }

    #[test]
    fn test_validate() {
        assert!(SynthConfig::default().validate().is_ok());
        let bad_rate = SynthConfig {
            sample_rate: 48_000,
            ..Default::default()
        };
        assert!(bad_rate.validate().is_err());
        assert!(SynthConfig::preview(0.0).validate().is_err());
    }
}
