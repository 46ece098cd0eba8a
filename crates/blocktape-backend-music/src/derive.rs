//! Source-event batch to [`MusicParameters`].
//!
//! Derivation is a pure function of the batch and a time bucket. The only
//! other input is one random draw for the seed suffix, taken from the
//! injected [`EntropySource`].

use blocktape_spec::hash::{select_index, short_hash};
use blocktape_spec::params::{
    FeatureFlags, MusicParameters, RhythmPatterns, SectionLengths, TimeSignature,
};
use blocktape_spec::theory::{PitchClass, ScaleMode};
use blocktape_spec::{validate_batch, BatchStats, SourceEvent};
use tracing::debug;

use crate::catalogue::{
    spell_progression, BASS_GROOVES, DURATIONS, HIHATS, KICKS, MELODIES, PROGRESSIONS, SNARES,
};
use crate::config::DeriveConfig;
use crate::entropy::{time_bucket, EntropySource};
use crate::error::{DeriveError, DeriveResult};

/// Octaves used by bass, chords, and melody. Never derived from input.
pub const OCTAVE_RANGE: (i32, i32) = (1, 3);

const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const SUFFIX_LEN: usize = 6;

/// Derives music parameters from event batches.
#[derive(Debug, Clone, Default)]
pub struct ParameterDeriver {
    config: DeriveConfig,
}

impl ParameterDeriver {
    /// Creates a deriver, rejecting inconsistent configuration.
    pub fn new(config: DeriveConfig) -> DeriveResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DeriveConfig {
        &self.config
    }

    /// Time bucket for a timestamp under this configuration.
    pub fn bucket_for(&self, now_ms: u64) -> u64 {
        time_bucket(now_ms, self.config.time_bucket_interval_ms)
    }

    /// Derives parameters using the entropy source's clock for the time bucket.
    pub fn derive(
        &self,
        events: &[SourceEvent],
        entropy: &dyn EntropySource,
    ) -> DeriveResult<MusicParameters> {
        let bucket = self.bucket_for(entropy.now_ms());
        self.derive_with_bucket(events, bucket, entropy)
    }

    /// Derives parameters for a caller-pinned time bucket.
    ///
    /// `events` must be non-empty and ordered most-recent-last. The first
    /// event is the primary event whose identifiers pick key, scale, and
    /// catalogue entries.
    pub fn derive_with_bucket(
        &self,
        events: &[SourceEvent],
        bucket: u64,
        entropy: &dyn EntropySource,
    ) -> DeriveResult<MusicParameters> {
        let validation = validate_batch(events);
        if !validation.is_ok() {
            return Err(DeriveError::from_validation(&validation));
        }
        let primary = events
            .first()
            .ok_or_else(|| DeriveError::InvalidInput("event batch is empty".to_string()))?;

        let stats = BatchStats::from_events(events);
        let cost_norm = self.normalized_cost(stats.average_cost);
        let flow_norm = self.normalized_flow(stats.average_flow);
        let jitter = stats.cost_coefficient_of_variation();

        let tempo = self.tempo_for(stats.average_cost);
        let swing = (self.config.base_swing + jitter * self.config.swing_jitter_scale)
            .clamp(0.0, self.config.max_swing);

        let key = PitchClass::ALL[select_index(&primary.origin, "key", 0, PitchClass::ALL.len())];
        let scale =
            ScaleMode::ALL[select_index(&primary.value, "scale", 0, ScaleMode::ALL.len())];

        let hash = primary.content_hash.as_str();
        let pick = |salt: &str, len: usize| select_index(hash, salt, bucket, len);

        let progression = PROGRESSIONS[pick("chords", PROGRESSIONS.len())];
        let patterns = RhythmPatterns {
            kick: KICKS[pick("kick", KICKS.len())].to_vec(),
            snare: SNARES[pick("snare", SNARES.len())].to_vec(),
            hihat: HIHATS[pick("hihat", HIHATS.len())].to_vec(),
            bass: BASS_GROOVES[pick("bass", BASS_GROOVES.len())].to_vec(),
        };

        let seed = format!(
            "{}_{}_{}_{}",
            self.config.genre,
            short_hash(hash, 8),
            bucket,
            random_suffix(entropy.random())
        );

        let params = MusicParameters {
            genre: self.config.genre.clone(),
            tempo,
            time_signature: TimeSignature::FOUR_FOUR,
            swing,
            key,
            scale,
            chord_progression: spell_progression(progression, key),
            melody_pattern: MELODIES[pick("melody", MELODIES.len())].to_vec(),
            note_durations: DURATIONS[pick("durations", DURATIONS.len())].to_vec(),
            octave_range: OCTAVE_RANGE,
            patterns,
            volume: (0.55 + 0.3 * flow_norm).clamp(0.0, 1.0),
            reverb: (0.25 + 0.35 * (1.0 - cost_norm)).clamp(0.0, 1.0),
            delay: (0.15 + 0.2 * cost_norm).clamp(0.0, 1.0),
            distortion: (0.1 + 0.25 * jitter).clamp(0.0, 0.6),
            filter_cutoff: (0.35 + 0.5 * flow_norm).clamp(0.0, 1.0),
            sections: SectionLengths::default(),
            features: FeatureFlags {
                extended_chords: self.config.extended_chords,
                vinyl_texture: self.config.vinyl_texture,
                tape_saturation: self.config.tape_saturation,
            },
            time_bucket: bucket,
            seed,
        };

        debug!(
            events = events.len(),
            bucket,
            tempo = params.tempo,
            key = %params.key,
            scale = %params.scale,
            seed = %params.seed,
            "derived music parameters"
        );

        Ok(params)
    }

    /// Tempo for an average cost: linear over `[0, cost_ceiling]`, clamped
    /// to the configured range.
    pub fn tempo_for(&self, average_cost: f64) -> f64 {
        let span = self.config.tempo_max - self.config.tempo_min;
        (self.config.tempo_min + self.normalized_cost(average_cost) * span)
            .clamp(self.config.tempo_min, self.config.tempo_max)
    }

    /// Activity level in `[0, 1]` combining normalized cost and flow.
    pub fn activity(&self, stats: &BatchStats) -> f64 {
        0.5 * (self.normalized_cost(stats.average_cost) + self.normalized_flow(stats.average_flow))
    }

    fn normalized_cost(&self, cost: f64) -> f64 {
        normalize(cost, self.config.cost_ceiling)
    }

    fn normalized_flow(&self, flow: f64) -> f64 {
        normalize(flow, self.config.flow_ceiling)
    }
}

fn normalize(value: f64, ceiling: f64) -> f64 {
    if value.is_finite() && ceiling > 0.0 {
        (value / ceiling).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Base-36 suffix from a uniform draw in `[0, 1)`.
fn random_suffix(r: f64) -> String {
    let r = if r.is_finite() { r.clamp(0.0, 1.0) } else { 0.0 };
    let mut n = (r * 36f64.powi(SUFFIX_LEN as i32)) as u64;
    let mut out = [b'0'; SUFFIX_LEN];
    for slot in out.iter_mut().rev() {
        *slot = SUFFIX_ALPHABET[(n % 36) as usize];
        n /= 36;
    }
    out.iter().map(|&b| b as char).collect()
}

/// Derives parameters with the default configuration.
pub fn derive(
    events: &[SourceEvent],
    entropy: &dyn EntropySource,
) -> DeriveResult<MusicParameters> {
    ParameterDeriver::default().derive(events, entropy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::FixedEntropy;
    use pretty_assertions::assert_eq;

    fn batch(cost: f64) -> Vec<SourceEvent> {
        (0..10)
            .map(|i| {
                SourceEvent::builder(18_000_000 + i, format!("0xorigin{}", i % 3))
                    .timestamp(1_700_000_000 + i * 12)
                    .cost(cost)
                    .flow(21_000.0 + i as f64 * 1000.0)
                    .destination("0xdest")
                    .value(format!("{}", i * 1_000_000))
                    .build()
            })
            .collect()
    }

    fn strip_suffix(seed: &str) -> &str {
        &seed[..seed.rfind('_').unwrap()]
    }

    #[test]
    fn test_low_cost_scenario() {
        let deriver = ParameterDeriver::default();
        let params = deriver
            .derive_with_bucket(&batch(5e9), 0, &FixedEntropy::new(0, 1))
            .unwrap();
        assert!(params.tempo >= 70.0 && params.tempo <= 80.0, "{}", params.tempo);
        assert!((params.tempo - 71.0).abs() < 1e-9);
        assert_eq!(params.octave_range, (1, 3));
        assert_eq!(params.time_bucket, 0);
    }

    #[test]
    fn test_determinism_except_suffix() {
        let deriver = ParameterDeriver::default();
        let events = batch(20e9);
        let a = deriver
            .derive_with_bucket(&events, 42, &FixedEntropy::new(0, 1))
            .unwrap();
        let b = deriver
            .derive_with_bucket(&events, 42, &FixedEntropy::new(0, 2))
            .unwrap();

        assert_ne!(a.seed, b.seed);
        assert_eq!(strip_suffix(&a.seed), strip_suffix(&b.seed));
        let b = MusicParameters {
            seed: a.seed.clone(),
            ..b
        };
        assert_eq!(a, b);
    }

    #[test]
    fn test_seed_format() {
        let events = batch(5e9);
        let params = ParameterDeriver::default()
            .derive_with_bucket(&events, 7, &FixedEntropy::new(0, 1))
            .unwrap();
        let parts: Vec<&str> = params.seed.split('_').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "lofi");
        assert_eq!(parts[1], short_hash(&events[0].content_hash, 8));
        assert_eq!(parts[2], "7");
        assert_eq!(parts[3].len(), SUFFIX_LEN);
    }

    #[test]
    fn test_tempo_clamped() {
        let deriver = ParameterDeriver::default();
        assert_eq!(deriver.tempo_for(0.0), 70.0);
        assert_eq!(deriver.tempo_for(1e15), 90.0);
        assert_eq!(deriver.tempo_for(50e9), 80.0);
    }

    #[test]
    fn test_swing_tracks_jitter() {
        let deriver = ParameterDeriver::default();
        let entropy = FixedEntropy::new(0, 1);
        let steady = deriver.derive_with_bucket(&batch(5e9), 0, &entropy).unwrap();
        assert!((steady.swing - 0.1).abs() < 1e-12);

        let mut jittery = batch(5e9);
        for (i, e) in jittery.iter_mut().enumerate() {
            *e = SourceEvent::builder(e.sequence, e.origin.clone())
                .cost(if i % 2 == 0 { 1e9 } else { 9e9 })
                .flow(e.flow)
                .value(e.value.clone())
                .build();
        }
        let loose = deriver.derive_with_bucket(&jittery, 0, &entropy).unwrap();
        assert!(loose.swing > steady.swing);
        assert!(loose.swing <= deriver.config().max_swing);
    }

    #[test]
    fn test_bucket_changes_catalogue_picks() {
        let deriver = ParameterDeriver::default();
        let entropy = FixedEntropy::new(0, 1);
        let events = batch(5e9);
        let picks: Vec<_> = (0..16)
            .map(|bucket| {
                let p = deriver.derive_with_bucket(&events, bucket, &entropy).unwrap();
                (p.chord_progression, p.melody_pattern)
            })
            .collect();
        assert!(picks.iter().any(|p| p != &picks[0]));

        let p0 = deriver.derive_with_bucket(&events, 0, &entropy).unwrap();
        let p1 = deriver.derive_with_bucket(&events, 1, &entropy).unwrap();
        assert_eq!(p0.key, p1.key);
        assert_eq!(p0.scale, p1.scale);
    }

    #[test]
    fn test_derive_uses_entropy_clock() {
        let deriver = ParameterDeriver::default();
        let params = deriver
            .derive(&batch(5e9), &FixedEntropy::new(180_000, 1))
            .unwrap();
        assert_eq!(params.time_bucket, 3);
    }

    #[test]
    fn test_invalid_input() {
        let entropy = FixedEntropy::new(0, 1);
        let err = derive(&[], &entropy).unwrap_err();
        assert!(matches!(err, DeriveError::InvalidInput(_)));

        let mut unordered = batch(5e9);
        unordered.reverse();
        let err = derive(&unordered, &entropy).unwrap_err();
        assert!(err.to_string().contains("E002"));
    }

    #[test]
    fn test_random_suffix() {
        assert_eq!(random_suffix(0.0), "000000");
        assert_eq!(random_suffix(0.999_999_999_999).len(), SUFFIX_LEN);
        assert_eq!(random_suffix(f64::NAN), "000000");
    }
}
