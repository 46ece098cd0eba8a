//! Pitch classes, modes, chord symbols, and frequency conversion.
//!
//! Shared by parameter derivation (spelling chord symbols in a key) and by
//! synthesis (voicing those symbols back into frequencies).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concert pitch reference (A4).
pub const A4_FREQ: f64 = 440.0;

/// MIDI note number of A4.
pub const A4_MIDI: i32 = 69;

/// The twelve pitch classes, spelled with sharps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "D#")]
    DSharp,
    #[serde(rename = "E")]
    E,
    #[serde(rename = "F")]
    F,
    #[serde(rename = "F#")]
    FSharp,
    #[serde(rename = "G")]
    G,
    #[serde(rename = "G#")]
    GSharp,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A#")]
    ASharp,
    #[serde(rename = "B")]
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order starting at C.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    /// Semitone offset above C (0-11).
    pub fn semitone(self) -> u8 {
        self as u8
    }

    /// Builds a pitch class from any semitone value (wraps modulo 12).
    pub fn from_semitone(semitone: i32) -> Self {
        Self::ALL[semitone.rem_euclid(12) as usize]
    }

    /// Transposes by a number of semitones.
    pub fn transpose(self, semitones: i32) -> Self {
        Self::from_semitone(self.semitone() as i32 + semitones)
    }

    /// Returns the sharp spelling ("C", "F#", ...).
    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }

    /// Parses a pitch class prefix from the start of `s`.
    ///
    /// Returns the pitch class and the number of bytes consumed. Accepts
    /// sharps (`#`) and flats (`b`).
    pub fn parse_prefix(s: &str) -> Option<(PitchClass, usize)> {
        let bytes = s.as_bytes();
        let base: i32 = match bytes.first()?.to_ascii_uppercase() {
            b'C' => 0,
            b'D' => 2,
            b'E' => 4,
            b'F' => 5,
            b'G' => 7,
            b'A' => 9,
            b'B' => 11,
            _ => return None,
        };
        match bytes.get(1) {
            Some(b'#') => Some((Self::from_semitone(base + 1), 2)),
            Some(b'b') => Some((Self::from_semitone(base - 1), 2)),
            _ => Some((Self::from_semitone(base), 1)),
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = TheoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match Self::parse_prefix(trimmed) {
            Some((pc, consumed)) if consumed == trimmed.len() => Ok(pc),
            _ => Err(TheoryError::InvalidPitchClass(trimmed.to_string())),
        }
    }
}

/// Diatonic modes available to the derivation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    Ionian,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Aeolian,
}

impl ScaleMode {
    /// All modes in table order.
    pub const ALL: [ScaleMode; 6] = [
        ScaleMode::Ionian,
        ScaleMode::Dorian,
        ScaleMode::Phrygian,
        ScaleMode::Lydian,
        ScaleMode::Mixolydian,
        ScaleMode::Aeolian,
    ];

    /// Semitone offsets of the seven scale degrees.
    pub fn intervals(self) -> [i32; 7] {
        match self {
            ScaleMode::Ionian => [0, 2, 4, 5, 7, 9, 11],
            ScaleMode::Dorian => [0, 2, 3, 5, 7, 9, 10],
            ScaleMode::Phrygian => [0, 1, 3, 5, 7, 8, 10],
            ScaleMode::Lydian => [0, 2, 4, 6, 7, 9, 11],
            ScaleMode::Mixolydian => [0, 2, 4, 5, 7, 9, 10],
            ScaleMode::Aeolian => [0, 2, 3, 5, 7, 8, 10],
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            ScaleMode::Ionian => "Ionian",
            ScaleMode::Dorian => "Dorian",
            ScaleMode::Phrygian => "Phrygian",
            ScaleMode::Lydian => "Lydian",
            ScaleMode::Mixolydian => "Mixolydian",
            ScaleMode::Aeolian => "Aeolian",
        }
    }

    /// Semitone offset of a 1-based scale degree; degrees wrap into higher octaves.
    ///
    /// Degree 8 is the octave, degree 0 and negative degrees walk downwards.
    pub fn degree_offset(self, degree: i32) -> i32 {
        let zero_based = degree.saturating_sub(1);
        let octave = zero_based.div_euclid(7);
        let step = zero_based.rem_euclid(7) as usize;
        octave.saturating_mul(12).saturating_add(self.intervals()[step])
    }
}

impl fmt::Display for ScaleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Chord qualities used by the pattern catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChordQuality {
    Maj7,
    Min7,
    Dom7,
    Maj9,
    Min9,
    Dom9,
    Min11,
    Six,
    Sus2,
    HalfDim7,
}

impl ChordQuality {
    /// Symbol suffixes, longest first so parsing is greedy.
    const SUFFIXES: [(&'static str, ChordQuality); 10] = [
        ("maj9", ChordQuality::Maj9),
        ("maj7", ChordQuality::Maj7),
        ("m7b5", ChordQuality::HalfDim7),
        ("m11", ChordQuality::Min11),
        ("sus2", ChordQuality::Sus2),
        ("m9", ChordQuality::Min9),
        ("m7", ChordQuality::Min7),
        ("9", ChordQuality::Dom9),
        ("7", ChordQuality::Dom7),
        ("6", ChordQuality::Six),
    ];

    /// Symbol suffix ("maj7", "m9", ...).
    pub fn suffix(self) -> &'static str {
        Self::SUFFIXES
            .iter()
            .find(|(_, q)| *q == self)
            .map(|(s, _)| *s)
            .unwrap_or("")
    }

    /// Core chord tones in semitones above the root.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ChordQuality::Maj7 | ChordQuality::Maj9 => &[0, 4, 7, 11],
            ChordQuality::Min7 | ChordQuality::Min9 | ChordQuality::Min11 => &[0, 3, 7, 10],
            ChordQuality::Dom7 | ChordQuality::Dom9 => &[0, 4, 7, 10],
            ChordQuality::Six => &[0, 4, 7, 9],
            ChordQuality::Sus2 => &[0, 2, 7, 10],
            ChordQuality::HalfDim7 => &[0, 3, 6, 10],
        }
    }

    /// Upper extensions (9th, 11th) voiced when extended chords are enabled.
    pub fn extensions(self) -> &'static [i32] {
        match self {
            ChordQuality::Maj9 | ChordQuality::Min9 | ChordQuality::Dom9 => &[14],
            ChordQuality::Min11 => &[14, 17],
            ChordQuality::Maj7 | ChordQuality::Six => &[14],
            ChordQuality::Min7 => &[14, 17],
            ChordQuality::Dom7 | ChordQuality::Sus2 | ChordQuality::HalfDim7 => &[],
        }
    }
}

/// A parsed chord symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chord {
    /// Chord root.
    pub root: PitchClass,
    /// Chord quality.
    pub quality: ChordQuality,
}

impl Chord {
    /// Creates a chord.
    pub fn new(root: PitchClass, quality: ChordQuality) -> Self {
        Self { root, quality }
    }

    /// Spells the chord as a symbol ("Cmaj7", "F#m9").
    pub fn symbol(&self) -> String {
        format!("{}{}", self.root.name(), self.quality.suffix())
    }

    /// Semitone offsets above the root, optionally including extensions.
    pub fn tones(&self, extended: bool) -> Vec<i32> {
        let mut tones = self.quality.intervals().to_vec();
        if extended {
            tones.extend_from_slice(self.quality.extensions());
        }
        tones
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

impl FromStr for Chord {
    type Err = TheoryError;

    /// Parses a chord symbol like "Cmaj7", "Bbm9", or "F#7".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (root, consumed) = PitchClass::parse_prefix(trimmed)
            .ok_or_else(|| TheoryError::InvalidChord(trimmed.to_string()))?;
        let rest = &trimmed[consumed..];
        ChordQuality::SUFFIXES
            .iter()
            .find(|(suffix, _)| *suffix == rest)
            .map(|(_, quality)| Chord::new(root, *quality))
            .ok_or_else(|| TheoryError::InvalidChord(trimmed.to_string()))
    }
}

/// Errors from parsing theory symbols.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TheoryError {
    /// Not a valid pitch class name.
    #[error("invalid pitch class '{0}'")]
    InvalidPitchClass(String),
    /// Not a valid chord symbol.
    #[error("invalid chord symbol '{0}'")]
    InvalidChord(String),
}

/// Converts a MIDI note number to a frequency in Hz.
///
/// ```
/// use blocktape_spec::theory::midi_to_freq;
/// assert!((midi_to_freq(69) - 440.0).abs() < 1e-9);
/// assert!((midi_to_freq(57) - 220.0).abs() < 1e-9);
/// ```
pub fn midi_to_freq(midi: i32) -> f64 {
    A4_FREQ * 2.0_f64.powf((midi as f64 - A4_MIDI as f64) / 12.0)
}

/// MIDI note number of a pitch class in an octave (C4 = 60).
pub fn midi_note(pc: PitchClass, octave: i32) -> i32 {
    octave
        .saturating_add(1)
        .saturating_mul(12)
        .saturating_add(pc.semitone() as i32)
}

/// Frequency of a pitch class in an octave plus a semitone offset.
pub fn note_freq(pc: PitchClass, octave: i32, semitone_offset: i32) -> f64 {
    midi_to_freq(midi_note(pc, octave).saturating_add(semitone_offset))
}
