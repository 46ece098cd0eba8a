//! Parameter set resolved into what the voices read per sample.
//!
//! Chord symbols are parsed once, empty pattern tables are replaced by the
//! defaults, and octave registers are fixed, so malformed parameters
//! degrade instead of failing.

use blocktape_spec::params::{
    MusicParameters, RhythmPatterns, SectionLengths, DEFAULT_BASS, DEFAULT_HIHAT, DEFAULT_KICK,
    DEFAULT_SNARE,
};
use blocktape_spec::theory::{Chord, ChordQuality, PitchClass, ScaleMode};
use tracing::warn;

use super::melody::MelodyLine;
use super::pattern_or;

/// Longest section the arrangement honors, in bars.
pub const MAX_SECTION_BARS: u32 = 1024;

/// Octaves for each pitched voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Bass fundamental octave; the sub-oscillator sits one below.
    pub bass: i32,
    /// Chord root octave (one above the bass).
    pub chords: i32,
    /// Melody base octave.
    pub melody: i32,
}

impl Registers {
    /// Places the voices inside an octave range.
    pub fn from_range(range: (i32, i32)) -> Self {
        let (lo, hi) = if range.0 <= range.1 {
            range
        } else {
            (range.1, range.0)
        };
        let lo = lo.clamp(0, 6);
        let hi = hi.clamp(lo, 7);
        let bass = lo + 1;
        Self {
            bass,
            chords: bass + 1,
            melody: hi.max(bass + 1),
        }
    }
}

/// Structural section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Intro,
    Verse,
    Chorus,
    Outro,
}

/// Per-voice gains for a section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionMix {
    pub drums: f64,
    pub bass: f64,
    pub chords: f64,
    pub melody: f64,
}

impl Section {
    /// How loud each voice group plays in this section.
    pub fn mix(self) -> SectionMix {
        match self {
            Section::Intro => SectionMix {
                drums: 0.6,
                bass: 0.7,
                chords: 1.0,
                melody: 0.0,
            },
            Section::Verse => SectionMix {
                drums: 1.0,
                bass: 1.0,
                chords: 0.9,
                melody: 0.7,
            },
            Section::Chorus => SectionMix {
                drums: 1.0,
                bass: 1.0,
                chords: 1.0,
                melody: 1.0,
            },
            Section::Outro => SectionMix {
                drums: 0.5,
                bass: 0.6,
                chords: 1.0,
                melody: 0.4,
            },
        }
    }
}

/// Everything the voices need, resolved from [`MusicParameters`].
#[derive(Debug, Clone)]
pub struct Arrangement {
    pub key: PitchClass,
    pub scale: ScaleMode,
    /// One chord per bar, looped; never empty.
    pub chords: Vec<Chord>,
    pub melody: MelodyLine,
    /// Rhythm tables with empty entries replaced by defaults.
    pub patterns: RhythmPatterns,
    pub swing: f64,
    pub beats_per_bar: f64,
    pub seconds_per_beat: f64,
    pub registers: Registers,
    pub extended_chords: bool,
    pub sections: SectionLengths,
}

impl Arrangement {
    /// Resolves parameters, substituting defaults for anything unusable.
    pub fn from_params(params: &MusicParameters) -> Self {
        let key = params.key;
        let mut chords: Vec<Chord> = params
            .chord_progression
            .iter()
            .map(|symbol| {
                symbol.parse::<Chord>().unwrap_or_else(|err| {
                    warn!(%err, "unparseable chord, using tonic minor seventh");
                    Chord::new(key, ChordQuality::Min7)
                })
            })
            .collect();
        if chords.is_empty() {
            chords = default_progression(key);
        }

        let patterns = RhythmPatterns {
            kick: pattern_or(&params.patterns.kick, &DEFAULT_KICK).to_vec(),
            snare: pattern_or(&params.patterns.snare, &DEFAULT_SNARE).to_vec(),
            hihat: pattern_or(&params.patterns.hihat, &DEFAULT_HIHAT).to_vec(),
            bass: pattern_or(&params.patterns.bass, &DEFAULT_BASS).to_vec(),
        };

        let swing = if params.swing.is_finite() {
            params.swing.clamp(0.0, 1.0)
        } else {
            0.0
        };

        Self {
            key,
            scale: params.scale,
            chords,
            melody: MelodyLine::new(&params.melody_pattern, &params.note_durations),
            patterns,
            swing,
            beats_per_bar: params.beats_per_bar() as f64,
            seconds_per_beat: params.seconds_per_beat(),
            registers: Registers::from_range(params.octave_range),
            extended_chords: params.features.extended_chords,
            sections: clamp_sections(params.sections),
        }
    }

    /// Bar index containing `beat`.
    pub fn bar_at(&self, beat: f64) -> u64 {
        (beat.max(0.0) / self.beats_per_bar).floor() as u64
    }

    /// Chord sounding during `beat`.
    pub fn chord_at(&self, beat: f64) -> Chord {
        let bar = self.bar_at(beat) as usize;
        self.chords[bar % self.chords.len()]
    }

    /// Section containing `beat`; anything past the end counts as outro.
    pub fn section_at(&self, beat: f64) -> Section {
        let bar = self.bar_at(beat);
        let intro = self.sections.intro as u64;
        let verse = intro + self.sections.verse as u64;
        let chorus = verse + self.sections.chorus as u64;
        if bar < intro {
            Section::Intro
        } else if bar < verse {
            Section::Verse
        } else if bar < chorus {
            Section::Chorus
        } else {
            Section::Outro
        }
    }
}

fn clamp_sections(sections: SectionLengths) -> SectionLengths {
    SectionLengths {
        intro: sections.intro.min(MAX_SECTION_BARS),
        verse: sections.verse.min(MAX_SECTION_BARS),
        chorus: sections.chorus.min(MAX_SECTION_BARS),
        outro: sections.outro.min(MAX_SECTION_BARS),
    }
}

/// I - IV in the track key.
fn default_progression(key: PitchClass) -> Vec<Chord> {
    vec![
        Chord::new(key, ChordQuality::Maj7),
        Chord::new(key.transpose(5), ChordQuality::Maj7),
    ]
}
