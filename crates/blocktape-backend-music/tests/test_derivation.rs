//! Derivation integration tests.

use blocktape_backend_music::{
    DeriveConfig, DeriveError, Evolution, FixedEntropy, ParameterDeriver,
};
use blocktape_spec::theory::Chord;
use blocktape_spec::{BackendError, SourceEvent};

fn events(count: u64, cost: f64) -> Vec<SourceEvent> {
    (0..count)
        .map(|i| {
            SourceEvent::builder(19_000_000 + i, format!("0x{:040x}", i * 7919))
                .parent_hash(format!("0x{:064x}", i))
                .timestamp(1_710_000_000 + i * 12)
                .cost(cost)
                .flow(150_000.0)
                .destination("0x000000000000000000000000000000000000dead")
                .value("2500000000000000000")
                .build()
        })
        .collect()
}

// ============================================================================
// Contract Tests
// ============================================================================

#[test]
fn test_all_catalogue_fields_populated() {
    let params = ParameterDeriver::default()
        .derive_with_bucket(&events(10, 12e9), 3, &FixedEntropy::new(0, 9))
        .unwrap();

    assert_eq!(params.chord_progression.len(), 4);
    for symbol in &params.chord_progression {
        assert!(symbol.parse::<Chord>().is_ok(), "unparseable chord {}", symbol);
    }
    assert!(!params.melody_pattern.is_empty());
    assert!(!params.note_durations.is_empty());
    assert_eq!(params.patterns.kick.len(), 16);
    assert_eq!(params.patterns.snare.len(), 16);
    assert_eq!(params.patterns.hihat.len(), 16);
    assert_eq!(params.patterns.bass.len(), 16);
    assert_eq!(params.sections.total_bars(), 24);
    assert_eq!(params.time_signature.to_string(), "4/4");

    for v in [
        params.volume,
        params.reverb,
        params.delay,
        params.distortion,
        params.filter_cutoff,
        params.swing,
    ] {
        assert!((0.0..=1.0).contains(&v));
    }
}

#[test]
fn test_primary_event_is_first() {
    let deriver = ParameterDeriver::default();
    let entropy = FixedEntropy::new(0, 1);
    let base = events(5, 5e9);

    // Appending newer events leaves key and scale untouched.
    let mut longer = base.clone();
    longer.extend(events(8, 5e9).into_iter().skip(5));

    let a = deriver.derive_with_bucket(&base, 0, &entropy).unwrap();
    let b = deriver.derive_with_bucket(&longer, 0, &entropy).unwrap();
    assert_eq!(a.key, b.key);
    assert_eq!(a.scale, b.scale);
    assert_eq!(a.chord_progression, b.chord_progression);
}

#[test]
fn test_tempo_rises_with_cost() {
    let deriver = ParameterDeriver::default();
    let entropy = FixedEntropy::new(0, 1);
    let tempos: Vec<f64> = [1e9, 20e9, 60e9, 200e9]
        .iter()
        .map(|&cost| {
            deriver
                .derive_with_bucket(&events(10, cost), 0, &entropy)
                .unwrap()
                .tempo
        })
        .collect();

    assert!(tempos.windows(2).all(|w| w[0] <= w[1]), "{:?}", tempos);
    assert_eq!(tempos[3], 90.0);
}

#[test]
fn test_feature_flags_follow_config() {
    let deriver = ParameterDeriver::new(DeriveConfig {
        extended_chords: false,
        vinyl_texture: false,
        ..Default::default()
    })
    .unwrap();
    let params = deriver
        .derive_with_bucket(&events(3, 5e9), 0, &FixedEntropy::new(0, 1))
        .unwrap();
    assert!(!params.features.extended_chords);
    assert!(!params.features.vinyl_texture);
    assert!(params.features.tape_saturation);
}

#[test]
fn test_invalid_config_rejected() {
    let err = ParameterDeriver::new(DeriveConfig {
        time_bucket_interval_ms: 0,
        ..Default::default()
    })
    .unwrap_err();
    assert_eq!(err.code(), "MUSIC_002");
}

#[test]
fn test_tampered_event_rejected() {
    let mut batch = events(3, 5e9);
    batch[1].cost = 1.0;
    let err = ParameterDeriver::default()
        .derive_with_bucket(&batch, 0, &FixedEntropy::new(0, 1))
        .unwrap_err();
    assert!(matches!(err, DeriveError::InvalidInput(ref m) if m.contains("E005")));
}

// ============================================================================
// Evolution Tests
// ============================================================================

#[test]
fn test_evolution_drift_is_gradual_across_tracks() {
    let deriver = ParameterDeriver::default();
    let entropy = FixedEntropy::new(0, 1);
    let base = deriver
        .derive_with_bucket(&events(10, 30e9), 0, &entropy)
        .unwrap();
    let range = (deriver.config().tempo_min, deriver.config().tempo_max);

    let mut evolution = Evolution::default();
    let mut previous_tempo = base.tempo;
    for tick in 1..=60 {
        evolution = evolution.step(tick as f64 * 30.0, 0.8, 0.02);
        let evolved = evolution.apply(&base, range);
        assert!((evolved.tempo - previous_tempo).abs() <= 0.02 * 4.0 + 1e-9);
        assert!(evolved.tempo >= range.0 && evolved.tempo <= range.1);
        previous_tempo = evolved.tempo;
    }
}
