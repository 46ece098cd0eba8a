//! Blocktape Audio Backend
//!
//! This crate renders [`MusicParameters`](blocktape_spec::MusicParameters)
//! to 16-bit stereo PCM at 44.1 kHz and packages the result as a
//! [`GeneratedTrack`](blocktape_spec::GeneratedTrack).
//!
//! # Overview
//!
//! Every output frame is computed independently from the frame clock:
//!
//! - **Drums** - pitch-swept kick, tonal-plus-noise snare, short hi-hat
//! - **Bass** - sub-oscillator and harmonics on the chord roots, with ghost notes
//! - **Chords** - a pad voicing each bar's chord, with optional extensions
//! - **Melody** - a looped line with rests, vibrato, and slow pitch bend
//! - **Texture** - vinyl crackle and hiss
//!
//! The voices are summed with different left and right weights, then run
//! through a mastering chain (lowpass, bitcrush, reverb approximation, echo,
//! two saturation stages, compressor, wow and flutter) before clipping.
//!
//! # Determinism
//!
//! Rendering is deterministic: the same parameters produce the same PCM.
//! Noise is a stateless hash of (seed, frame); the crackle schedule uses
//! PCG32 seeded from the track seed through BLAKE3.
//!
//! # Example
//!
//! ```ignore
//! use blocktape_backend_audio::{package, SynthConfig, Synthesizer};
//!
//! let synth = Synthesizer::new(SynthConfig::preview(10.0))?;
//! let buffer = synth.synthesize(&params)?;
//! let track = package(&events, &params, buffer, now_ms)?;
//! std::fs::write("track.wav", &track.wav_data)?;
//! ```
//!
//! # Crate Structure
//!
//! - [`synth`]: Per-frame renderer
//! - [`voices`]: Voice generators and the resolved arrangement
//! - [`mixer`]: Stereo voice summing
//! - [`effects`]: Mastering chain
//! - [`envelope`] / [`oscillator`]: Building blocks
//! - [`rng`]: Deterministic randomness
//! - [`wav`]: RIFF/WAVE writing and parsing
//! - [`package`]: Track id, metadata, and provenance

pub mod config;
pub mod effects;
pub mod envelope;
pub mod error;
pub mod mixer;
pub mod oscillator;
pub mod package;
pub mod rng;
pub mod synth;
pub mod voices;
pub mod wav;

pub use config::SynthConfig;
pub use error::{AudioError, AudioResult};
pub use package::{package, track_id, PackageOptions, Packager};
pub use synth::{synthesize, Synthesizer};
pub use wav::{parse_wav_header, WavInfo};

/// Crate version for backend identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend identifier.
pub const BACKEND_ID: &str = "blocktape-backend-audio";

#[cfg(test)]
pub(crate) mod test_support {
    use blocktape_spec::{
        FeatureFlags, MusicParameters, PitchClass, RhythmPatterns, ScaleMode, SectionLengths,
        TimeSignature,
    };

    /// A fixed, hand-written parameter set.
    pub fn params() -> MusicParameters {
        MusicParameters {
            genre: "lofi".to_string(),
            tempo: 80.0,
            time_signature: TimeSignature::FOUR_FOUR,
            swing: 0.1,
            key: PitchClass::A,
            scale: ScaleMode::Dorian,
            chord_progression: vec!["Am9".to_string(), "D9".to_string()],
            melody_pattern: vec![1, 3, 0, 5],
            note_durations: vec![1.0],
            octave_range: (1, 3),
            patterns: RhythmPatterns::standard(),
            volume: 0.7,
            reverb: 0.4,
            delay: 0.2,
            distortion: 0.1,
            filter_cutoff: 0.5,
            sections: SectionLengths::default(),
            features: FeatureFlags::default(),
            time_bucket: 0,
            seed: "lofi_00000000_0_abcdef".to_string(),
        }
    }
}
