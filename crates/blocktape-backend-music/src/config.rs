//! Derivation tuning.

use serde::{Deserialize, Serialize};

use crate::error::{DeriveError, DeriveResult};

/// Tunable constants for [`ParameterDeriver`](crate::ParameterDeriver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeriveConfig {
    /// Genre tag written into seeds and metadata.
    pub genre: String,
    /// Lower bound of the tempo range (BPM).
    pub tempo_min: f64,
    /// Upper bound of the tempo range (BPM).
    pub tempo_max: f64,
    /// Average cost that maps to `tempo_max`.
    pub cost_ceiling: f64,
    /// Average flow that maps to full volume and the brightest filter.
    pub flow_ceiling: f64,
    /// Swing applied to a perfectly steady batch.
    pub base_swing: f64,
    /// Swing added per unit of cost coefficient of variation.
    pub swing_jitter_scale: f64,
    /// Upper bound on swing.
    pub max_swing: f64,
    /// Width of a time bucket in milliseconds.
    pub time_bucket_interval_ms: u64,
    pub extended_chords: bool,
    pub vinyl_texture: bool,
    pub tape_saturation: bool,
}

impl Default for DeriveConfig {
    fn default() -> Self {
        Self {
            genre: "lofi".to_string(),
            tempo_min: 70.0,
            tempo_max: 90.0,
            cost_ceiling: 100e9,
            flow_ceiling: 1_000_000.0,
            base_swing: 0.1,
            swing_jitter_scale: 0.15,
            max_swing: 0.4,
            time_bucket_interval_ms: 60_000,
            extended_chords: true,
            vinyl_texture: true,
            tape_saturation: true,
        }
    }
}

impl DeriveConfig {
    /// Checks that the ranges are usable.
    pub fn validate(&self) -> DeriveResult<()> {
        if self.genre.is_empty() || self.genre.contains('_') {
            return Err(DeriveError::invalid_config(
                "genre",
                "must be non-empty and must not contain '_'",
            ));
        }
        if !(self.tempo_min.is_finite() && self.tempo_max.is_finite())
            || self.tempo_min <= 0.0
            || self.tempo_min > self.tempo_max
        {
            return Err(DeriveError::invalid_config(
                "tempo_min",
                format!(
                    "tempo range {}..{} must be positive and ordered",
                    self.tempo_min, self.tempo_max
                ),
            ));
        }
        if !(self.cost_ceiling > 0.0) {
            return Err(DeriveError::invalid_config(
                "cost_ceiling",
                "must be positive",
            ));
        }
        if !(self.flow_ceiling > 0.0) {
            return Err(DeriveError::invalid_config(
                "flow_ceiling",
                "must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.base_swing) || !(0.0..=1.0).contains(&self.max_swing) {
            return Err(DeriveError::invalid_config(
                "base_swing",
                "swing bounds must be within 0..=1",
            ));
        }
        if self.time_bucket_interval_ms == 0 {
            return Err(DeriveError::invalid_config(
                "time_bucket_interval_ms",
                "must be positive",
            ));
        }
        Ok(())
    }
}
