//! Gradual configuration evolution for long streaming sessions.
//!
//! An [`Evolution`] holds four normalized biases in `[-1, 1]`. Each step
//! moves them toward a target that depends on elapsed session time (a slow
//! cycle) and on current batch activity, by at most `max_step` per bias, so
//! consecutive tracks never jump.

use std::f64::consts::TAU;

use blocktape_spec::MusicParameters;
use serde::{Deserialize, Serialize};

/// Length of one full evolution cycle in seconds.
pub const EVOLUTION_PERIOD_SECONDS: f64 = 1800.0;

/// Tempo change in BPM at full bias.
pub const TEMPO_SPAN_BPM: f64 = 4.0;
/// Swing change at full bias.
pub const SWING_SPAN: f64 = 0.05;
/// Reverb change at full bias.
pub const REVERB_SPAN: f64 = 0.15;
/// Filter cutoff change at full bias.
pub const FILTER_SPAN: f64 = 0.2;

/// Accumulated nudges applied on top of freshly derived parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Evolution {
    pub tempo_bias: f64,
    pub swing_bias: f64,
    pub reverb_bias: f64,
    pub filter_bias: f64,
}

impl Evolution {
    /// Target biases for a moment in the session.
    pub fn target(elapsed_seconds: f64, activity: f64) -> Evolution {
        let phase = (elapsed_seconds.max(0.0) / EVOLUTION_PERIOD_SECONDS) * TAU;
        let activity = if activity.is_finite() {
            activity.clamp(0.0, 1.0)
        } else {
            0.5
        };
        let lean = activity * 2.0 - 1.0;

        Evolution {
            tempo_bias: 0.5 * phase.sin() + 0.5 * lean,
            swing_bias: phase.cos(),
            reverb_bias: -lean,
            filter_bias: 0.6 * lean + 0.4 * (0.5 * phase).sin(),
        }
    }

    /// Moves each bias toward the target by at most `max_step`.
    pub fn step(&self, elapsed_seconds: f64, activity: f64, max_step: f64) -> Evolution {
        let target = Self::target(elapsed_seconds, activity);
        let max_step = max_step.abs();
        let approach = |current: f64, goal: f64| {
            (current + (goal - current).clamp(-max_step, max_step)).clamp(-1.0, 1.0)
        };

        Evolution {
            tempo_bias: approach(self.tempo_bias, target.tempo_bias),
            swing_bias: approach(self.swing_bias, target.swing_bias),
            reverb_bias: approach(self.reverb_bias, target.reverb_bias),
            filter_bias: approach(self.filter_bias, target.filter_bias),
        }
    }

    /// Returns true if every bias is zero.
    pub fn is_neutral(&self) -> bool {
        *self == Evolution::default()
    }

    /// Applies the biases, keeping tempo inside `tempo_range`.
    pub fn apply(&self, params: &MusicParameters, tempo_range: (f64, f64)) -> MusicParameters {
        let (lo, hi) = tempo_range;
        MusicParameters {
            tempo: (params.tempo + self.tempo_bias * TEMPO_SPAN_BPM).clamp(lo, hi),
            swing: (params.swing + self.swing_bias * SWING_SPAN).clamp(0.0, 1.0),
            reverb: (params.reverb + self.reverb_bias * REVERB_SPAN).clamp(0.0, 1.0),
            filter_cutoff: (params.filter_cutoff + self.filter_bias * FILTER_SPAN)
                .clamp(0.0, 1.0),
            ..params.clone()
        }
    }
}
