//! Sub bass following the chord roots.

use blocktape_spec::theory::note_freq;

use super::{sum_recent_hits, Arrangement, FrameClock, STEPS_PER_BEAT};
use crate::envelope::attack_decay;
use crate::oscillator::sine;

/// Steps a bass note rings for.
const TAIL_STEPS: usize = 6;

/// Sub-oscillator one octave down plus the fundamental and two harmonics.
///
/// Each step of the groove table is a note on the root of the chord for
/// that step's bar; the table value is the note's amplitude, so small
/// values play as ghost notes.
pub fn bass(arr: &Arrangement, clock: &FrameClock) -> f64 {
    let steps_per_bar = arr.beats_per_bar * STEPS_PER_BEAT as f64;
    sum_recent_hits(
        &arr.patterns.bass,
        clock,
        arr.swing,
        TAIL_STEPS,
        |dt, step, velocity| {
            let bar_beat = (step as f64 / steps_per_bar).floor() * arr.beats_per_bar;
            let root = arr.chord_at(bar_beat).root;
            let freq = note_freq(root, arr.registers.bass, 0);
            let tone = 0.55 * sine(0.5 * freq * dt)
                + 0.3 * sine(freq * dt)
                + 0.1 * sine(2.0 * freq * dt)
                + 0.05 * sine(3.0 * freq * dt);
            // Ghost notes are short as well as quiet.
            let rate = if velocity < 0.35 { 14.0 } else { 3.5 };
            velocity * attack_decay(dt, 0.006, rate) * tone
        },
    )
}
