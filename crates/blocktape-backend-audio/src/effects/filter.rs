//! Biquad lowpass and one-pole smoothing.
//!
//! Coefficients follow the Audio EQ Cookbook.

use std::f64::consts::PI;

/// Normalized biquad coefficients (a0 = 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Lowpass coefficients.
    ///
    /// # Arguments
    /// * `cutoff` - Cutoff frequency in Hz, clamped below Nyquist
    /// * `q` - Resonance; 0.707 is Butterworth, higher values add a bump
    /// * `sample_rate` - Sample rate in Hz
    pub fn lowpass(cutoff: f64, q: f64, sample_rate: f64) -> Self {
        let q = q.max(0.5);
        let cutoff = cutoff.clamp(20.0, sample_rate * 0.45);
        let omega = 2.0 * PI * cutoff / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Direct form I biquad.
#[derive(Debug, Clone)]
pub struct Biquad {
    coeffs: BiquadCoeffs,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    pub fn new(coeffs: BiquadCoeffs) -> Self {
        Self {
            coeffs,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Swaps coefficients, keeping the filter history.
    pub fn set_coeffs(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let c = &self.coeffs;
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        if !output.is_finite() {
            self.reset();
            return 0.0;
        }

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }

    /// Clears the filter history.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

/// One-pole lowpass, used for smoothing and smearing.
#[derive(Debug, Clone)]
pub struct OnePole {
    coeff: f64,
    y1: f64,
}

impl OnePole {
    /// Smoother whose step response reaches 63% after `time_ms`.
    pub fn with_time(time_ms: f64, sample_rate: f64) -> Self {
        let coeff = (-1.0 / (time_ms.max(0.01) * 0.001 * sample_rate)).exp();
        Self { coeff, y1: 0.0 }
    }

    pub fn process(&mut self, input: f64) -> f64 {
        self.y1 = input + self.coeff * (self.y1 - input);
        self.y1
    }

    pub fn value(&self) -> f64 {
        self.y1
    }
}
