//! Single-voice lead line.

use std::f64::consts::TAU;

use blocktape_spec::theory::note_freq;

use super::{Arrangement, FrameClock};
use crate::envelope::Adsr;
use crate::oscillator::{sine, triangle, vibrato_phase};

/// Melody used when the pattern is empty.
pub const DEFAULT_MELODY: [i32; 4] = [1, 3, 5, 0];
/// Scale degrees are clamped to +/- this many steps.
pub const MAX_DEGREE: i32 = 64;

const LEAD: Adsr = Adsr::new(0.012, 0.15, 0.6, 0.12);
/// Fraction of a note's length that is held before release.
const ARTICULATION: f64 = 0.8;
/// Every Nth bar is left empty.
const BREATH_EVERY_BARS: u64 = 4;
const VIBRATO_DEPTH: f64 = 0.004;
const VIBRATO_RATE_HZ: f64 = 5.5;
/// Slow bend: cents of drift and its LFO rate.
const BEND_CENTS: f64 = 12.0;
const BEND_RATE_HZ: f64 = 0.07;

/// One note of the melodic cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MelodyNote {
    /// Start within the cycle, in beats.
    pub start: f64,
    /// Length in beats.
    pub length: f64,
    /// 1-based scale degree; 0 is a rest.
    pub degree: i32,
}

/// A looped sequence of notes.
#[derive(Debug, Clone, PartialEq)]
pub struct MelodyLine {
    notes: Vec<MelodyNote>,
    cycle_beats: f64,
}

impl MelodyLine {
    /// Pairs degrees with durations (durations loop when shorter).
    ///
    /// Empty patterns use [`DEFAULT_MELODY`]; empty or non-positive
    /// durations become one beat. Degrees are held to +/-[`MAX_DEGREE`].
    pub fn new(pattern: &[i32], durations: &[f64]) -> Self {
        let pattern: &[i32] = if pattern.is_empty() {
            &DEFAULT_MELODY
        } else {
            pattern
        };

        let mut notes = Vec::with_capacity(pattern.len());
        let mut start = 0.0;
        for (i, &degree) in pattern.iter().enumerate() {
            let length = durations
                .get(i % durations.len().max(1))
                .copied()
                .filter(|d| d.is_finite() && *d > 0.0)
                .map(|d| d.clamp(0.125, 8.0))
                .unwrap_or(1.0);
            notes.push(MelodyNote {
                start,
                length,
                degree: degree.clamp(-MAX_DEGREE, MAX_DEGREE),
            });
            start += length;
        }

        Self {
            notes,
            cycle_beats: start,
        }
    }

    /// Notes of one cycle.
    pub fn notes(&self) -> &[MelodyNote] {
        &self.notes
    }

    /// Length of one cycle in beats.
    pub fn cycle_beats(&self) -> f64 {
        self.cycle_beats
    }

    /// The note sounding at `beat` and the one before it, each paired with
    /// its absolute onset in beats.
    pub fn notes_near(&self, beat: f64) -> [Option<(MelodyNote, f64)>; 2] {
        let cycle_index = (beat / self.cycle_beats).floor();
        let cycle_start = cycle_index * self.cycle_beats;
        let pos = beat - cycle_start;
        let idx = self
            .notes
            .partition_point(|n| n.start <= pos)
            .saturating_sub(1);

        let current = self.notes[idx];
        let previous = if idx > 0 {
            Some((self.notes[idx - 1], cycle_start + self.notes[idx - 1].start))
        } else if cycle_index >= 1.0 {
            self.notes
                .last()
                .map(|n| (*n, cycle_start - self.cycle_beats + n.start))
        } else {
            None
        };

        [previous, Some((current, cycle_start + current.start))]
    }
}

/// Lead voice with rests, vibrato, and a slow pitch bend.
pub fn melody(arr: &Arrangement, clock: &FrameClock) -> f64 {
    let spb = clock.seconds_per_beat;
    let mut out = 0.0;

    for (note, onset_beat) in arr.melody.notes_near(clock.beat).into_iter().flatten() {
        if note.degree == 0 {
            continue;
        }
        let bar = arr.bar_at(onset_beat);
        if bar % BREATH_EVERY_BARS == BREATH_EVERY_BARS - 1 {
            continue;
        }

        let dt = (clock.beat - onset_beat) * spb;
        let level = LEAD.level(dt, note.length * spb * ARTICULATION);
        if level <= 0.0 {
            continue;
        }

        let onset_seconds = onset_beat * spb;
        let bend = 2f64.powf(BEND_CENTS * (TAU * BEND_RATE_HZ * onset_seconds).sin() / 1200.0);
        let freq = note_freq(
            arr.key,
            arr.registers.melody,
            arr.scale.degree_offset(note.degree),
        ) * bend;
        let phase = vibrato_phase(freq, dt, VIBRATO_DEPTH, VIBRATO_RATE_HZ);
        out += level * (0.7 * sine(phase) + 0.3 * triangle(phase));
    }

    out
}
