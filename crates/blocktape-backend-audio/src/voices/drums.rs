//! Kick, snare, and hi-hat.
//!
//! Each generator takes its step pattern directly. An empty pattern falls
//! back to the matching `DEFAULT_*` table, so these functions never fail
//! and always return a finite sample.

use blocktape_spec::params::{DEFAULT_HIHAT, DEFAULT_KICK, DEFAULT_SNARE};

use super::{pattern_or, sum_recent_hits, FrameClock};
use crate::envelope::{attack_decay, exp_decay};
use crate::oscillator::sine;
use crate::rng::hash_noise;

/// Steps of tail kept for kick and snare.
const LONG_TAIL_STEPS: usize = 4;
/// Steps of tail kept for the hi-hat.
const SHORT_TAIL_STEPS: usize = 2;

/// Pitch-swept sine kick with a soft second partial.
pub fn kick(pattern: &[f64], clock: &FrameClock, swing: f64) -> f64 {
    let pattern = pattern_or(pattern, &DEFAULT_KICK);
    sum_recent_hits(pattern, clock, swing, LONG_TAIL_STEPS, |dt, _, velocity| {
        // Frequency falls from 130 Hz to 48 Hz; phase is the closed-form integral.
        let phase = 48.0 * dt + 82.0 * (1.0 - (-28.0 * dt).exp()) / 28.0;
        let body = sine(phase) + 0.25 * sine(2.0 * phase);
        let click = exp_decay(dt, 400.0) * 0.3;
        velocity * attack_decay(dt, 0.002, 7.5) * (body / 1.25 + click)
    })
}

/// Two tonal partials plus a noise burst.
pub fn snare(pattern: &[f64], clock: &FrameClock, swing: f64, noise_seed: u32) -> f64 {
    let pattern = pattern_or(pattern, &DEFAULT_SNARE);
    let noise = hash_noise(noise_seed, clock.index);
    sum_recent_hits(pattern, clock, swing, LONG_TAIL_STEPS, |dt, _, velocity| {
        let tone = 0.6 * sine(185.0 * dt) + 0.4 * sine(330.0 * dt);
        let tonal = exp_decay(dt, 22.0) * tone;
        let rattle = exp_decay(dt, 13.0) * noise;
        velocity * attack_decay(dt, 0.001, 0.0) * (0.45 * tonal + 0.55 * rattle)
    })
}

/// High partial plus light, high-passed noise with a very short decay.
pub fn hihat(pattern: &[f64], clock: &FrameClock, swing: f64, noise_seed: u32) -> f64 {
    let pattern = pattern_or(pattern, &DEFAULT_HIHAT);
    // First difference of white noise leans the spectrum upwards.
    let bright = 0.5
        * (hash_noise(noise_seed, clock.index)
            - hash_noise(noise_seed, clock.index.wrapping_sub(1)));
    sum_recent_hits(pattern, clock, swing, SHORT_TAIL_STEPS, |dt, _, velocity| {
        let metal = 0.5 * sine(8_200.0 * dt) + 0.5 * sine(11_300.0 * dt);
        velocity * exp_decay(dt, 55.0) * (0.3 * metal + 0.7 * bright)
    })
}
