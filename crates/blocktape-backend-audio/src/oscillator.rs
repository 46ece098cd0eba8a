//! Stateless waveform functions of phase.
//!
//! Phases are in cycles (1.0 = one period), so callers can accumulate
//! `freq * t` directly.

use std::f64::consts::TAU;

/// Sine at a phase in cycles.
#[inline]
pub fn sine(phase: f64) -> f64 {
    (TAU * phase).sin()
}

/// Triangle at a phase in cycles, in `[-1, 1]`.
#[inline]
pub fn triangle(phase: f64) -> f64 {
    let p = phase.rem_euclid(1.0);
    if p < 0.25 {
        4.0 * p
    } else if p < 0.75 {
        2.0 - 4.0 * p
    } else {
        4.0 * p - 4.0
    }
}

/// Sine plus a few decaying harmonics; a warm, slightly hollow tone.
///
/// `harmonics` holds relative amplitudes of partials 2, 3, ...
#[inline]
pub fn additive(phase: f64, harmonics: &[f64]) -> f64 {
    let mut out = sine(phase);
    let mut norm = 1.0;
    for (i, &amp) in harmonics.iter().enumerate() {
        out += amp * sine(phase * (i as f64 + 2.0));
        norm += amp.abs();
    }
    out / norm
}

/// Phase of a sine whose frequency is modulated by a sinusoid.
///
/// Integrates `f * (1 + depth * sin(2π rate t))` analytically so vibrato
/// does not accumulate phase error.
#[inline]
pub fn vibrato_phase(freq: f64, t: f64, depth: f64, rate: f64) -> f64 {
    if rate <= 0.0 {
        return freq * t;
    }
    freq * t + freq * depth * (1.0 - (TAU * rate * t).cos()) / (TAU * rate)
}
