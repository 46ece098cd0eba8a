//! Mastering chain applied to every mixed frame.
//!
//! Stages, in order:
//! 1. Lowpass with a slowly swept, level-dependent cutoff and a resonance bump
//! 2. Bit-depth reduction
//! 3. Reverb approximation: slow periodic gain lift plus a one-pole smear
//! 4. Tempo-synced echo
//! 5. `tanh` distortion
//! 6. `tanh` tape saturation (when enabled)
//! 7. Soft-knee compressor, stereo-linked
//! 8. Wow and flutter as a slow amplitude wobble
//!
//! The reverb and wow/flutter stages are approximations. Neither convolves
//! with an impulse response, and wow/flutter scales the level rather than
//! the pitch, so nothing is resampled.

pub mod delay_line;
pub mod dynamics;
pub mod filter;
pub mod saturation;

use std::f64::consts::TAU;

use blocktape_spec::MusicParameters;

use crate::mixer::StereoFrame;
use delay_line::DelayLine;
use dynamics::Compressor;
use filter::{Biquad, BiquadCoeffs, OnePole};
use saturation::{bitcrush, distortion_drive, tanh_drive, CRUSH_BITS, TAPE_DRIVE};

/// Cutoff at `filter_cutoff = 0`; each unit of `filter_cutoff` is a decade.
const BASE_CUTOFF_HZ: f64 = 800.0;
const FILTER_Q: f64 = 1.2;
const CUTOFF_SWEEP_DEPTH: f64 = 0.15;
const CUTOFF_SWEEP_HZ: f64 = 0.05;
/// Cutoff drop at full level.
const LEVEL_DARKENING: f64 = 0.3;
/// Filter coefficients are recomputed every this many frames.
const COEFF_UPDATE_INTERVAL: u64 = 32;

const REVERB_LIFT: f64 = 0.3;
const REVERB_LFO_HZ: f64 = 0.1;
const REVERB_SMEAR_MS: f64 = 40.0;

/// Echo time in beats (dotted eighth).
const ECHO_BEATS: f64 = 0.75;
const ECHO_FEEDBACK: f64 = 0.35;
const ECHO_MIX_SCALE: f64 = 0.25;

const WOW_DEPTH: f64 = 0.004;
const WOW_HZ: f64 = 0.5;
const FLUTTER_DEPTH: f64 = 0.002;
const FLUTTER_HZ: f64 = 6.0;

/// Mastering amounts taken from a parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasteringSettings {
    /// 0-1, in decades above [`BASE_CUTOFF_HZ`].
    pub filter_cutoff: f64,
    pub reverb: f64,
    pub delay: f64,
    pub distortion: f64,
    pub tape_saturation: bool,
    /// Echo time in seconds.
    pub echo_seconds: f64,
}

impl MasteringSettings {
    pub fn from_params(params: &MusicParameters) -> Self {
        Self {
            filter_cutoff: unit_or(params.filter_cutoff, 0.5),
            reverb: unit_or(params.reverb, 0.0),
            delay: unit_or(params.delay, 0.0),
            distortion: unit_or(params.distortion, 0.0),
            tape_saturation: params.features.tape_saturation,
            echo_seconds: ECHO_BEATS * params.seconds_per_beat(),
        }
    }
}

/// Clamps to `[0, 1]`, replacing non-finite values.
fn unit_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

/// Per-channel state of the chain.
#[derive(Debug, Clone)]
struct ChannelState {
    filter: Biquad,
    level: OnePole,
    smear: OnePole,
    echo: DelayLine,
}

impl ChannelState {
    fn new(coeffs: BiquadCoeffs, echo_samples: usize, sample_rate: f64) -> Self {
        Self {
            filter: Biquad::new(coeffs),
            level: OnePole::with_time(10.0, sample_rate),
            smear: OnePole::with_time(REVERB_SMEAR_MS, sample_rate),
            echo: DelayLine::new(echo_samples + 1),
        }
    }
}

/// Stateful mastering chain for one render.
#[derive(Debug, Clone)]
pub struct MasteringChain {
    settings: MasteringSettings,
    sample_rate: f64,
    echo_samples: usize,
    channels: [ChannelState; 2],
    compressor: Compressor,
}

impl MasteringChain {
    pub fn new(settings: MasteringSettings, sample_rate: u32) -> Self {
        let sr = sample_rate as f64;
        let echo_samples = (settings.echo_seconds.clamp(0.01, 4.0) * sr).round() as usize;
        let coeffs = BiquadCoeffs::lowpass(base_cutoff(settings.filter_cutoff), FILTER_Q, sr);
        let channel = ChannelState::new(coeffs, echo_samples, sr);
        Self {
            settings,
            sample_rate: sr,
            echo_samples,
            channels: [channel.clone(), channel],
            compressor: Compressor::mastering(sr),
        }
    }

    pub fn settings(&self) -> &MasteringSettings {
        &self.settings
    }

    /// Processes the frame at `index`. Output is finite and within `[-1, 1]`.
    pub fn process(&mut self, index: u64, frame: StereoFrame) -> StereoFrame {
        let t = index as f64 / self.sample_rate;
        let s = self.settings;

        if index % COEFF_UPDATE_INTERVAL == 0 {
            let sweep = 1.0 + CUTOFF_SWEEP_DEPTH * (TAU * CUTOFF_SWEEP_HZ * t).sin();
            for ch in &mut self.channels {
                let level = ch.level.value().abs().min(1.0);
                let cutoff = base_cutoff(s.filter_cutoff) * sweep * (1.0 - LEVEL_DARKENING * level);
                ch.filter
                    .set_coeffs(BiquadCoeffs::lowpass(cutoff, FILTER_Q, self.sample_rate));
            }
        }

        let reverb_gain = 1.0 + s.reverb * REVERB_LIFT * (0.5 + 0.5 * (TAU * REVERB_LFO_HZ * t).sin());
        let echo_mix = s.delay * ECHO_MIX_SCALE;
        let drive = distortion_drive(s.distortion);

        let mut out = [frame.left, frame.right];
        for (x, ch) in out.iter_mut().zip(self.channels.iter_mut()) {
            let input = if x.is_finite() { *x } else { 0.0 };
            ch.level.process(input.abs());

            let mut y = ch.filter.process(input);
            y = bitcrush(y, CRUSH_BITS);

            let smeared = ch.smear.process(y);
            y = y * reverb_gain + s.reverb * 0.5 * smeared;

            let echoed = ch.echo.read(self.echo_samples);
            ch.echo.write(y + ECHO_FEEDBACK * echoed);
            y += echo_mix * echoed;

            y = tanh_drive(y, drive);
            if s.tape_saturation {
                y = tanh_drive(y, TAPE_DRIVE);
            }
            *x = y;
        }

        let (l, r) = self.compressor.process(out[0], out[1]);
        let wobble = wobble_gain(t);

        StereoFrame {
            left: finish(l * wobble),
            right: finish(r * wobble),
        }
    }
}

/// Amplitude wobble standing in for tape wow and flutter.
fn wobble_gain(t: f64) -> f64 {
    1.0 + WOW_DEPTH * (TAU * WOW_HZ * t).sin() + FLUTTER_DEPTH * (TAU * FLUTTER_HZ * t).sin()
}

fn base_cutoff(filter_cutoff: f64) -> f64 {
    BASE_CUTOFF_HZ * 10f64.powf(filter_cutoff)
}

fn finish(sample: f64) -> f64 {
    if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}
