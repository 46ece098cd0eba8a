//! Streaming session configuration.

use std::path::Path;
use std::time::Duration;

use blocktape_backend_audio::{PackageOptions, SynthConfig};
use blocktape_backend_music::DeriveConfig;
use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Session manager settings, loadable from JSON.
///
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Period of the tick timer in milliseconds.
    pub tick_interval_ms: u64,
    /// Crossfade length between tracks in milliseconds.
    pub crossfade_ms: u64,
    /// Events requested from the data source per tick.
    pub fetch_count: usize,
    /// Average batch cost above which the current track is snapshotted.
    pub snapshot_cost_threshold: f64,
    /// Fraction of the current track after which the next one starts.
    pub advance_progress: f64,
    /// Relative change of batch cost or flow that starts a new track early.
    pub advance_change_ratio: f64,
    /// Nudge tempo, swing, reverb, and filter as the session ages.
    pub evolution_enabled: bool,
    /// Largest change of any evolution bias per generated track.
    pub evolution_max_step: f64,
    pub derive: DeriveConfig,
    pub synth: SynthConfig,
    pub package: PackageOptions,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 30_000,
            crossfade_ms: 2_000,
            fetch_count: 10,
            snapshot_cost_threshold: 50e9,
            advance_progress: 0.9,
            advance_change_ratio: 0.2,
            evolution_enabled: true,
            evolution_max_step: 0.05,
            derive: DeriveConfig::default(),
            synth: SynthConfig::default(),
            package: PackageOptions::default(),
        }
    }
}

impl StreamConfig {
    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> StreamResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: StreamConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn crossfade(&self) -> Duration {
        Duration::from_millis(self.crossfade_ms)
    }

    /// Checks every field, including the nested derive and synth settings.
    pub fn validate(&self) -> StreamResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(StreamError::Config("tick_interval_ms must be positive".into()));
        }
        if self.fetch_count == 0 {
            return Err(StreamError::Config("fetch_count must be positive".into()));
        }
        if !self.snapshot_cost_threshold.is_finite() || self.snapshot_cost_threshold < 0.0 {
            return Err(StreamError::Config(format!(
                "snapshot_cost_threshold must be a non-negative number, got {}",
                self.snapshot_cost_threshold
            )));
        }
        if !(self.advance_progress > 0.0 && self.advance_progress <= 1.0) {
            return Err(StreamError::Config(format!(
                "advance_progress must be in (0, 1], got {}",
                self.advance_progress
            )));
        }
        if !(self.advance_change_ratio.is_finite() && self.advance_change_ratio > 0.0) {
            return Err(StreamError::Config(format!(
                "advance_change_ratio must be positive, got {}",
                self.advance_change_ratio
            )));
        }
        if !(0.0..=1.0).contains(&self.evolution_max_step) {
            return Err(StreamError::Config(format!(
                "evolution_max_step must be in [0, 1], got {}",
                self.evolution_max_step
            )));
        }
        self.derive.validate()?;
        self.synth.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StreamConfig::default();
        assert_eq!(config.tick_interval(), Duration::from_secs(30));
        assert_eq!(config.crossfade(), Duration::from_secs(2));
        assert_eq!(config.fetch_count, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tick_interval_ms": 5000, "derive": {{"tempo_min": 72}}, "synth": {{"preview_seconds": 4}}}}"#
        )
        .unwrap();

        let config = StreamConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.tick_interval_ms, 5_000);
        assert_eq!(config.crossfade_ms, 2_000);
        assert_eq!(config.derive.tempo_min, 72.0);
        assert_eq!(config.derive.tempo_max, 90.0);
        assert_eq!(config.synth.preview_seconds, Some(4.0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            StreamConfig {
                tick_interval_ms: 0,
                ..Default::default()
            },
            StreamConfig {
                advance_progress: 1.5,
                ..Default::default()
            },
            StreamConfig {
                snapshot_cost_threshold: f64::NAN,
                ..Default::default()
            },
            StreamConfig {
                fetch_count: 0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(StreamError::Config(_))));
        }
    }

    #[test]
    fn test_nested_validation() {
        let mut config = StreamConfig::default();
        config.derive.genre = "lo_fi".to_string();
        assert!(matches!(config.validate(), Err(StreamError::Derive(_))));
    }
}
