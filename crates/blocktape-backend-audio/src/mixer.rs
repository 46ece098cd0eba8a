//! Voice summing into left and right channels.
//!
//! The right channel uses slightly different per-voice weights than the
//! left, which gives the mix its width without any panning stage.

use serde::Serialize;

/// One sample from every voice, before mixing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VoiceSamples {
    pub kick: f64,
    pub snare: f64,
    pub hihat: f64,
    pub bass: f64,
    pub chords: f64,
    pub melody: f64,
    pub texture: f64,
}

/// Per-voice gains for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MixWeights {
    pub kick: f64,
    pub snare: f64,
    pub hihat: f64,
    pub bass: f64,
    pub chords: f64,
    pub melody: f64,
    pub texture: f64,
}

impl MixWeights {
    /// Left-channel weights.
    pub const LEFT: MixWeights = MixWeights {
        kick: 0.85,
        snare: 0.5,
        hihat: 0.22,
        bass: 0.7,
        chords: 0.3,
        melody: 0.24,
        texture: 0.5,
    };

    /// Right-channel weights.
    pub const RIGHT: MixWeights = MixWeights {
        kick: 0.85,
        snare: 0.45,
        hihat: 0.3,
        bass: 0.7,
        chords: 0.26,
        melody: 0.3,
        texture: 0.44,
    };

    /// Weighted sum of the voices.
    #[inline]
    pub fn apply(&self, v: &VoiceSamples) -> f64 {
        self.kick * v.kick
            + self.snare * v.snare
            + self.hihat * v.hihat
            + self.bass * v.bass
            + self.chords * v.chords
            + self.melody * v.melody
            + self.texture * v.texture
    }
}

/// One stereo frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f64,
    pub right: f64,
}

/// Mixes voices into a stereo frame scaled by `gain`.
#[inline]
pub fn mix(voices: &VoiceSamples, gain: f64) -> StereoFrame {
    StereoFrame {
        left: MixWeights::LEFT.apply(voices) * gain,
        right: MixWeights::RIGHT.apply(voices) * gain,
    }
}

/// Converts a sample to 16-bit PCM, clipping to the representable range.
///
/// Non-finite input becomes silence.
#[inline]
pub fn to_i16(sample: f64) -> i16 {
    if !sample.is_finite() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}
