//! Musical parameter set describing one track.
//!
//! [`MusicParameters`] is created by the derivation engine, consumed by the
//! synthesis engine and the packager, and never mutated afterwards.

use serde::{Deserialize, Serialize};

use crate::theory::{PitchClass, ScaleMode};

/// Time signature as (beats per bar, beat unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    /// Beats per bar.
    pub beats: u32,
    /// Note value that gets one beat.
    pub unit: u32,
}

impl TimeSignature {
    /// Common time.
    pub const FOUR_FOUR: TimeSignature = TimeSignature { beats: 4, unit: 4 };
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::FOUR_FOUR
    }
}

impl std::fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.beats, self.unit)
    }
}

/// Structural section lengths in bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLengths {
    pub intro: u32,
    pub verse: u32,
    pub chorus: u32,
    pub outro: u32,
}

impl SectionLengths {
    /// Sum of all sections, saturating at `u32::MAX`.
    pub fn total_bars(&self) -> u32 {
        self.intro
            .saturating_add(self.verse)
            .saturating_add(self.chorus)
            .saturating_add(self.outro)
    }
}

impl Default for SectionLengths {
    fn default() -> Self {
        Self {
            intro: 4,
            verse: 8,
            chorus: 8,
            outro: 4,
        }
    }
}

/// Kick used when a pattern is empty: one and the "and" of three.
pub const DEFAULT_KICK: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.6, 0.0, 0.0, 0.0, 0.0, 0.0,
];

/// Snare used when a pattern is empty: backbeat on two and four.
pub const DEFAULT_SNARE: [f64; 16] = [
    0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0,
];

/// Hi-hat used when a pattern is empty: eighths with soft off-beats.
pub const DEFAULT_HIHAT: [f64; 16] = [
    0.8, 0.0, 0.4, 0.0, 0.8, 0.0, 0.4, 0.0, 0.8, 0.0, 0.4, 0.0, 0.8, 0.0, 0.4, 0.0,
];

/// Bass amplitude table used when a pattern is empty.
pub const DEFAULT_BASS: [f64; 16] = [
    1.0, 0.0, 0.0, 0.3, 0.0, 0.0, 0.7, 0.0, 0.9, 0.0, 0.0, 0.25, 0.0, 0.0, 0.6, 0.0,
];

/// Step-sequencer patterns for the rhythm section.
///
/// Each entry is a velocity in 0..=1 for one sixteenth-note step; zero
/// means silent. Patterns loop, so they may be any length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RhythmPatterns {
    pub kick: Vec<f64>,
    pub snare: Vec<f64>,
    pub hihat: Vec<f64>,
    /// Per-step bass amplitude table; low values are ghost notes.
    pub bass: Vec<f64>,
}

impl RhythmPatterns {
    /// The fallback patterns, as owned vectors.
    pub fn standard() -> Self {
        Self {
            kick: DEFAULT_KICK.to_vec(),
            snare: DEFAULT_SNARE.to_vec(),
            hihat: DEFAULT_HIHAT.to_vec(),
            bass: DEFAULT_BASS.to_vec(),
        }
    }
}

/// Boolean feature toggles that change the arrangement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Voice chords with 9th/11th extensions.
    pub extended_chords: bool,
    /// Render the vinyl crackle and hiss layer.
    pub vinyl_texture: bool,
    /// Apply the second (tape) saturation stage.
    pub tape_saturation: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            extended_chords: true,
            vinyl_texture: true,
            tape_saturation: true,
        }
    }
}

/// Slowest tempo the renderer honors, in BPM.
pub const MIN_TEMPO: f64 = 1.0;
/// Fastest tempo the renderer honors, in BPM.
pub const MAX_TEMPO: f64 = 1000.0;

/// Fully deterministic description of one track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicParameters {
    /// Genre tag used in seeds and metadata.
    pub genre: String,
    /// Beats per minute.
    pub tempo: f64,
    pub time_signature: TimeSignature,
    /// Swing amount (0-1); delays off-beat sixteenths.
    pub swing: f64,
    pub key: PitchClass,
    pub scale: ScaleMode,
    /// Ordered chord symbols, one per bar, looped.
    pub chord_progression: Vec<String>,
    /// Scale degrees (1-based); 0 is a rest.
    pub melody_pattern: Vec<i32>,
    /// Note durations in beats, parallel to `melody_pattern` (looped if shorter).
    pub note_durations: Vec<f64>,
    /// Lowest and highest octave used by bass, chords and melody.
    pub octave_range: (i32, i32),
    pub patterns: RhythmPatterns,
    /// Master volume (0-1).
    pub volume: f64,
    /// Reverb intensity (0-1).
    pub reverb: f64,
    /// Delay intensity (0-1).
    pub delay: f64,
    /// Distortion intensity (0-1).
    pub distortion: f64,
    /// Normalised lowpass cutoff (0-1); maps to roughly 800 Hz - 8 kHz.
    pub filter_cutoff: f64,
    pub sections: SectionLengths,
    pub features: FeatureFlags,
    /// Time bucket that fed catalogue selection.
    pub time_bucket: u64,
    /// `"<genre>_<hash8>_<bucket>_<suffix>"`
    pub seed: String,
}

impl MusicParameters {
    /// Beats per bar from the time signature (at least 1).
    pub fn beats_per_bar(&self) -> u32 {
        self.time_signature.beats.max(1)
    }

    /// Total structural length in bars.
    pub fn total_bars(&self) -> u32 {
        self.sections.total_bars()
    }

    /// Seconds per beat at the current tempo.
    ///
    /// Non-positive or non-finite tempos fall back to 80 BPM; anything else
    /// is held to [`MIN_TEMPO`]..=[`MAX_TEMPO`].
    pub fn seconds_per_beat(&self) -> f64 {
        let tempo = if self.tempo.is_finite() && self.tempo > 0.0 {
            self.tempo.clamp(MIN_TEMPO, MAX_TEMPO)
        } else {
            80.0
        };
        60.0 / tempo
    }

    /// Duration implied by the structure, before any cap.
    pub fn requested_duration_seconds(&self) -> f64 {
        self.total_bars() as f64 * self.beats_per_bar() as f64 * self.seconds_per_beat()
    }

    /// Serializes to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
