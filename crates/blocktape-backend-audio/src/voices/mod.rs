//! Per-voice generators.
//!
//! Every voice is a deterministic function of a [`FrameClock`] and the
//! track's [`Arrangement`]; none keeps state between samples, so a frame
//! can be rendered in isolation.

mod arrangement;
pub mod bass;
pub mod chords;
pub mod drums;
pub mod melody;
pub mod texture;

pub use arrangement::{Arrangement, Registers, Section, SectionMix};
pub use melody::{MelodyLine, MelodyNote};
pub use texture::VinylTexture;

/// Sixteenth-note steps per beat.
pub const STEPS_PER_BEAT: u32 = 4;

/// Position of one output frame in time and in the beat grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    /// Frame index from the start of the track.
    pub index: u64,
    /// Seconds from the start of the track.
    pub t: f64,
    /// Beats from the start of the track.
    pub beat: f64,
    /// Seconds per beat at the track tempo.
    pub seconds_per_beat: f64,
}

impl FrameClock {
    /// Clock for frame `index`.
    pub fn new(index: u64, sample_rate: u32, seconds_per_beat: f64) -> Self {
        let t = index as f64 / sample_rate as f64;
        Self {
            index,
            t,
            beat: t / seconds_per_beat,
            seconds_per_beat,
        }
    }
}

/// Start of a sixteenth step in beats. Odd steps are pushed late by swing,
/// up to half a sixteenth at full swing.
pub fn step_onset(step: i64, swing: f64) -> f64 {
    let base = step as f64 / STEPS_PER_BEAT as f64;
    if step.rem_euclid(2) == 1 {
        base + swing.clamp(0.0, 1.0) * 0.5 / STEPS_PER_BEAT as f64
    } else {
        base
    }
}

/// Returns `pattern`, or `fallback` when the pattern is empty.
pub fn pattern_or<'a>(pattern: &'a [f64], fallback: &'a [f64]) -> &'a [f64] {
    if pattern.is_empty() {
        fallback
    } else {
        pattern
    }
}

/// Velocity of a step, clamped to `[0, 1]`; non-finite entries are silent.
pub fn step_velocity(pattern: &[f64], step: i64) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    let v = pattern[step.rem_euclid(pattern.len() as i64) as usize];
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Sums `hit(seconds_since_onset, step, velocity)` over the current step and
/// the `lookback - 1` steps before it, so decaying tails overlap the next hit.
pub fn sum_recent_hits<F>(
    pattern: &[f64],
    clock: &FrameClock,
    swing: f64,
    lookback: usize,
    mut hit: F,
) -> f64
where
    F: FnMut(f64, i64, f64) -> f64,
{
    let current = (clock.beat * STEPS_PER_BEAT as f64).floor() as i64;
    let mut out = 0.0;
    for k in 0..lookback as i64 {
        let step = current - k;
        if step < 0 {
            break;
        }
        let velocity = step_velocity(pattern, step);
        if velocity <= 0.0 {
            continue;
        }
        let dt = (clock.beat - step_onset(step, swing)) * clock.seconds_per_beat;
        if dt >= 0.0 {
            out += hit(dt, step, velocity);
        }
    }
    out
}
