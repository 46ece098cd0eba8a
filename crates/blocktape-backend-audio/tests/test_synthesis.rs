//! Rendering integration tests: bounds, determinism, and degradation.

use blocktape_backend_audio::voices::drums::{hihat, kick, snare};
use blocktape_backend_audio::voices::FrameClock;
use blocktape_backend_audio::{SynthConfig, Synthesizer};
use blocktape_backend_music::{FixedEntropy, ParameterDeriver};
use blocktape_spec::{MusicParameters, RhythmPatterns, SourceEvent, SAMPLE_RATE};

fn batch(cost: f64) -> Vec<SourceEvent> {
    (0..10)
        .map(|i| {
            SourceEvent::builder(18_000_000 + i, format!("0x{:040x}", i * 7919))
                .cost(cost * (1.0 + 0.05 * i as f64))
                .flow(120_000.0)
                .value("1000000000000000000")
                .build()
        })
        .collect()
}

fn derived(cost: f64) -> MusicParameters {
    ParameterDeriver::default()
        .derive_with_bucket(&batch(cost), 0, &FixedEntropy::new(0, 7))
        .unwrap()
}

fn preview(seconds: f64) -> Synthesizer {
    Synthesizer::new(SynthConfig::preview(seconds)).unwrap()
}

// ============================================================================
// Bounds
// ============================================================================

#[test]
fn test_duration_never_exceeds_cap() {
    let mut params = derived(5e9);
    params.tempo = 30.0;
    params.sections.chorus = 500;

    let synth = Synthesizer::default();
    let frames = synth.frame_count(&params);
    assert_eq!(frames, 300 * SAMPLE_RATE as u64);
    assert!(frames * 4 <= 300 * 44_100 * 4);

    // A lower configured cap wins.
    let synth = Synthesizer::new(SynthConfig {
        max_duration_seconds: 1.0,
        ..Default::default()
    })
    .unwrap();
    let buffer = synth.synthesize(&params).unwrap();
    assert_eq!(buffer.num_frames(), SAMPLE_RATE as usize);
}

#[test]
fn test_short_structure_is_honored() {
    let mut params = derived(5e9);
    params.tempo = 120.0;
    params.sections.intro = 1;
    params.sections.verse = 0;
    params.sections.chorus = 0;
    params.sections.outro = 0;

    let buffer = Synthesizer::default().synthesize(&params).unwrap();
    // One bar of 4/4 at 120 BPM.
    assert_eq!(buffer.num_frames(), 2 * SAMPLE_RATE as usize);
}

#[test]
fn test_extreme_parameters_stay_in_range() {
    let mut params = derived(90e9);
    params.volume = 1.0;
    params.distortion = 1.0;
    params.reverb = 1.0;
    params.delay = 1.0;
    params.patterns = RhythmPatterns {
        kick: vec![1.0; 16],
        snare: vec![1.0; 16],
        hihat: vec![1.0; 16],
        bass: vec![1.0; 16],
    };

    let buffer = preview(2.0).synthesize(&params).unwrap();
    assert_eq!(buffer.samples.len(), 2 * 2 * SAMPLE_RATE as usize);
    // Rendering clips to +/-1.0 before conversion.
    assert!(buffer.samples.iter().all(|&s| s >= -32767));
    assert!(buffer.samples.iter().any(|&s| s != 0));
}

#[test]
fn test_non_finite_parameters_degrade() {
    let mut params = derived(5e9);
    params.tempo = f64::NAN;
    params.swing = f64::INFINITY;
    params.volume = f64::NAN;
    params.filter_cutoff = f64::NEG_INFINITY;

    let buffer = preview(0.5).synthesize(&params).unwrap();
    assert_eq!(buffer.num_frames(), SAMPLE_RATE as usize / 2);
    assert!(buffer.samples.iter().any(|&s| s != 0));
}

#[test]
fn test_overflowing_parameters_degrade() {
    let mut params = derived(5e9);
    params.sections.intro = u32::MAX;
    params.sections.verse = 8;
    params.time_signature.beats = u32::MAX;
    let buffer = preview(0.25).synthesize(&params).unwrap();
    assert_eq!(buffer.num_frames(), SAMPLE_RATE as usize / 4);

    let mut params = derived(5e9);
    params.melody_pattern = vec![i32::MIN, i32::MAX];
    params.octave_range = (i32::MIN, i32::MAX);
    params.tempo = 1e-320;
    let buffer = preview(0.25).synthesize(&params).unwrap();
    assert_eq!(buffer.num_frames(), SAMPLE_RATE as usize / 4);

    params.tempo = 1e300;
    let buffer = preview(0.25).synthesize(&params).unwrap();
    assert_eq!(buffer.num_frames(), SAMPLE_RATE as usize / 4);
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn test_render_is_deterministic() {
    let params = derived(5e9);
    let a = preview(1.0).synthesize(&params).unwrap();
    let b = preview(1.0).synthesize(&params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_seed_changes_texture() {
    let mut params = derived(5e9);
    let a = preview(1.0).synthesize(&params).unwrap();
    params.seed.push('z');
    let b = preview(1.0).synthesize(&params).unwrap();
    assert_ne!(a.samples, b.samples);
}

#[test]
fn test_channels_differ() {
    let buffer = preview(1.0).synthesize(&derived(5e9)).unwrap();
    let differing = (0..buffer.num_frames())
        .filter_map(|i| buffer.frame(i))
        .filter(|(l, r)| l != r)
        .count();
    assert!(differing > buffer.num_frames() / 2);
}

// ============================================================================
// Graceful degradation
// ============================================================================

#[test]
fn test_empty_patterns_render() {
    let mut params = derived(5e9);
    params.patterns = RhythmPatterns::default();
    params.chord_progression.clear();
    params.melody_pattern.clear();
    params.note_durations.clear();

    let with_defaults = preview(1.0).synthesize(&params).unwrap();
    assert!(with_defaults.samples.iter().any(|&s| s != 0));

    params.patterns = RhythmPatterns::standard();
    let standard = preview(1.0).synthesize(&params).unwrap();
    assert_eq!(with_defaults, standard);
}

#[test]
fn test_drum_generators_with_empty_patterns() {
    for i in (0..SAMPLE_RATE as u64 * 2).step_by(31) {
        let clock = FrameClock::new(i, SAMPLE_RATE, 0.75);
        for v in [
            kick(&[], &clock, 0.2),
            snare(&[], &clock, 0.2, 11),
            hihat(&[], &clock, 0.2, 11),
        ] {
            assert!(v.is_finite());
        }
    }
}

#[test]
fn test_vinyl_can_be_disabled() {
    let mut params = derived(5e9);
    let with_vinyl = preview(0.5).synthesize(&params).unwrap();

    params.features.vinyl_texture = false;
    let without = preview(0.5).synthesize(&params).unwrap();
    assert_ne!(with_vinyl.samples, without.samples);

    params.features.vinyl_texture = true;
    let config = SynthConfig {
        vinyl_enabled: false,
        ..SynthConfig::preview(0.5)
    };
    let disabled = Synthesizer::new(config).unwrap().synthesize(&params).unwrap();
    assert_eq!(disabled, without);
}
