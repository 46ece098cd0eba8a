//! Sustained chord pad, one chord per bar.

use blocktape_spec::theory::note_freq;

use super::{Arrangement, FrameClock};
use crate::envelope::Adsr;
use crate::oscillator::{additive, triangle};

const PAD: Adsr = Adsr::new(0.08, 0.6, 0.7, 0.35);

/// Slight per-note detune in cents, cycled over the voicing.
const DETUNE_CENTS: [f64; 4] = [0.0, 3.0, -4.0, 2.0];

/// Stacked chord tones with soft electric-piano partials.
///
/// Extensions (9th, 11th) are voiced when extended chords are enabled.
/// The previous bar's chord keeps sounding through its release.
pub fn chords(arr: &Arrangement, clock: &FrameClock) -> f64 {
    let bar_seconds = arr.beats_per_bar * arr.seconds_per_beat;
    let bar = arr.bar_at(clock.beat);
    let mut out = 0.0;

    for b in [bar.checked_sub(1), Some(bar)].into_iter().flatten() {
        let onset = b as f64 * bar_seconds;
        let dt = clock.t - onset;
        // Gate closes a little early so releases overlap the next chord.
        let level = PAD.level(dt, bar_seconds * 0.92);
        if level <= 0.0 {
            continue;
        }
        let chord = arr.chord_at(b as f64 * arr.beats_per_bar);
        let tones = chord.tones(arr.extended_chords);
        let mut stack = 0.0;
        for (i, &interval) in tones.iter().enumerate() {
            let cents = DETUNE_CENTS[i % DETUNE_CENTS.len()];
            let freq = note_freq(chord.root, arr.registers.chords, interval)
                * 2f64.powf(cents / 1200.0);
            let phase = freq * clock.t;
            stack += 0.8 * additive(phase, &[0.3, 0.1]) + 0.2 * triangle(phase);
        }
        out += level * stack / (tones.len() as f64).sqrt();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::params;

    fn energy(arr: &Arrangement, from: u64, to: u64) -> f64 {
        (from..to)
            .map(|i| {
                chords(arr, &FrameClock::new(i, 44_100, arr.seconds_per_beat)).powi(2)
            })
            .sum()
    }

    #[test]
    fn test_chords_are_finite() {
        let arr = Arrangement::from_params(&params());
        for i in (0..44_100u64 * 6).step_by(11) {
            let v = chords(&arr, &FrameClock::new(i, 44_100, arr.seconds_per_beat));
            assert!(v.is_finite());
            assert!(v.abs() < 4.0);
        }
    }

    #[test]
    fn test_extensions_change_voicing() {
        let mut p = params();
        p.features.extended_chords = false;
        let plain = Arrangement::from_params(&p);
        p.features.extended_chords = true;
        let extended = Arrangement::from_params(&p);

        let a = energy(&plain, 10_000, 12_000);
        let b = energy(&extended, 10_000, 12_000);
        assert!(a > 0.0 && b > 0.0);
        assert_ne!(a, b);
    }
}
