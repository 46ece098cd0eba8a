//! Hand-authored pattern catalogue.
//!
//! Every table is selected by index (see [`blocktape_spec::hash::select_index`]),
//! so entries may be appended but existing entries must not be reordered
//! without changing which tracks existing inputs produce.

use blocktape_spec::theory::{Chord, ChordQuality, PitchClass};
use blocktape_spec::{DEFAULT_BASS, DEFAULT_HIHAT, DEFAULT_KICK, DEFAULT_SNARE};

use ChordQuality::*;

/// One chord of a progression template: semitones above the key and quality.
pub type ChordStep = (i32, ChordQuality);

/// Progression templates, relative to the key root.
pub const PROGRESSIONS: &[&[ChordStep]] = &[
    // ii - V - I - vi
    &[(2, Min9), (7, Dom9), (0, Maj9), (9, Min7)],
    // i - iv - VII - III
    &[(0, Min9), (5, Min7), (10, Dom9), (3, Maj7)],
    // I - vi - IV - V
    &[(0, Maj7), (9, Min9), (5, Maj9), (7, Dom7)],
    // vi - IV - I - V
    &[(9, Min7), (5, Maj7), (0, Maj9), (7, Sus2)],
    // i - VI - III - VII
    &[(0, Min11), (8, Maj7), (3, Maj9), (10, Dom7)],
    // IV - iii - ii - I
    &[(5, Maj9), (4, Min7), (2, Min9), (0, Maj7)],
    // ii7b5 - V7 - i
    &[(2, HalfDim7), (7, Dom7), (0, Min9), (0, Min9)],
    // I6 - ii - iii - IV
    &[(0, Six), (2, Min7), (4, Min7), (5, Maj9)],
];

/// Melody patterns as 1-based scale degrees; 0 is a rest.
pub const MELODIES: &[&[i32]] = &[
    &[1, 3, 5, 0, 6, 5, 3, 0],
    &[5, 0, 4, 3, 0, 2, 1, 0],
    &[3, 0, 3, 5, 6, 0, 5, 0],
    &[8, 7, 5, 0, 3, 0, 2, 0],
    &[1, 0, 2, 3, 0, 0, 5, 0],
    &[6, 5, 0, 3, 2, 0, 1, 0],
    &[5, 6, 8, 0, 6, 5, 0, 0],
    &[2, 0, 4, 0, 3, 1, 0, 0],
];

/// Note durations in beats, looped alongside the melody.
pub const DURATIONS: &[&[f64]] = &[
    &[1.0],
    &[0.5, 0.5, 1.0],
    &[1.5, 0.5],
    &[0.5],
    &[1.0, 0.5, 0.5, 2.0],
    &[0.75, 0.25, 1.0],
];

/// Kick patterns, one velocity per sixteenth.
pub const KICKS: &[&[f64]] = &[
    &DEFAULT_KICK,
    &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.7, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    &[1.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.4, 0.0],
    &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.0],
];

/// Snare patterns.
pub const SNARES: &[&[f64]] = &[
    &DEFAULT_SNARE,
    &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.2, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
    &[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.3],
    &[0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.0, 0.0, 0.0, 0.25, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
];

/// Hi-hat patterns.
pub const HIHATS: &[&[f64]] = &[
    &DEFAULT_HIHAT,
    &[0.7, 0.3, 0.5, 0.3, 0.7, 0.3, 0.5, 0.3, 0.7, 0.3, 0.5, 0.3, 0.7, 0.3, 0.5, 0.3],
    &[0.8, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0],
    &[0.6, 0.0, 0.4, 0.2, 0.6, 0.0, 0.4, 0.0, 0.6, 0.0, 0.4, 0.2, 0.6, 0.0, 0.5, 0.3],
];

/// Bass amplitude tables; values below ~0.35 read as ghost notes.
pub const BASS_GROOVES: &[&[f64]] = &[
    &DEFAULT_BASS,
    &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
    &[1.0, 0.0, 0.3, 0.0, 0.0, 0.0, 0.8, 0.0, 0.0, 0.3, 0.0, 0.0, 0.7, 0.0, 0.0, 0.2],
    &[0.9, 0.0, 0.0, 0.0, 0.6, 0.0, 0.0, 0.25, 0.9, 0.0, 0.0, 0.0, 0.6, 0.0, 0.25, 0.0],
];

/// Spells a progression template as chord symbols in `key`.
pub fn spell_progression(template: &[ChordStep], key: PitchClass) -> Vec<String> {
    template
        .iter()
        .map(|&(offset, quality)| Chord::new(key.transpose(offset), quality).symbol())
        .collect()
}
