//! End-to-end generation tests: batch -> parameters -> audio -> container.
//!
//! ```bash
//! cargo test -p blocktape-tests --test e2e_generation
//! ```

use std::io::Cursor;

use blocktape_backend_audio::wav::{decode_samples, extract_pcm_data};
use blocktape_backend_audio::{parse_wav_header, AudioError, Packager, SynthConfig, Synthesizer};
use blocktape_backend_music::{FixedEntropy, ParameterDeriver};
use blocktape_spec::{
    AttributeValue, BackendError, SampleBuffer, MAX_DURATION_SECONDS, SAMPLE_RATE,
};
use blocktape_tests::fixtures::event_batch;
use pretty_assertions::assert_eq;

#[test]
fn test_low_cost_batch_scenario() {
    let events = event_batch(18_500_000, 10, 5e9);
    let params = ParameterDeriver::default()
        .derive_with_bucket(&events, 0, &FixedEntropy::new(0, 1))
        .unwrap();
    assert!((70.0..=80.0).contains(&params.tempo), "{}", params.tempo);
    assert_eq!(params.octave_range, (1, 3));
    assert_eq!(params.time_bucket, 0);
}

#[test]
fn test_full_pipeline_container_reads_back() {
    let events = event_batch(18_500_100, 10, 25e9);
    let params = ParameterDeriver::default()
        .derive_with_bucket(&events, 4, &FixedEntropy::new(0, 2))
        .unwrap();
    let buffer = Synthesizer::new(SynthConfig::preview(1.5))
        .unwrap()
        .synthesize(&params)
        .unwrap();
    let track = Packager::default()
        .package(&events, &params, buffer, 1_700_000_000_000)
        .unwrap();

    // Header per our parser.
    let info = parse_wav_header(&track.wav_data).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, SAMPLE_RATE);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.byte_rate, SAMPLE_RATE * 4);
    assert_eq!(info.block_align, 4);
    assert_eq!(info.num_frames, track.buffer.num_frames());

    // Header and samples per an independent decoder.
    let reader = hound::WavReader::new(Cursor::new(&track.wav_data)).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, SAMPLE_RATE);
    assert_eq!(spec.bits_per_sample, 16);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
    let decoded: Vec<i16> = reader.into_samples::<i16>().map(Result::unwrap).collect();
    assert_eq!(decoded, track.buffer.samples);
    assert_eq!(decode_samples(&track.wav_data).unwrap(), decoded);

    let pcm = extract_pcm_data(&track.wav_data).unwrap();
    assert_eq!(pcm.len(), track.buffer.byte_len());
    assert_eq!(track.wav_data.len(), 44 + pcm.len());
}

#[test]
fn test_metadata_describes_track() {
    let events = event_batch(18_500_200, 6, 15e9);
    let params = ParameterDeriver::default()
        .derive_with_bucket(&events, 1, &FixedEntropy::new(0, 3))
        .unwrap();
    let buffer = Synthesizer::new(SynthConfig::preview(0.5))
        .unwrap()
        .synthesize(&params)
        .unwrap();
    let track = Packager::default()
        .package(&events, &params, buffer, 0)
        .unwrap();

    let meta = &track.metadata;
    assert!(meta.name.contains("18500200"), "{}", meta.name);
    assert_eq!(
        meta.attribute("Block Number"),
        Some(&AttributeValue::Number(18_500_200.0))
    );
    assert_eq!(
        meta.attribute("Event Count"),
        Some(&AttributeValue::Number(6.0))
    );
    assert_eq!(
        meta.attribute("Genre"),
        Some(&AttributeValue::from("Lofi"))
    );
    assert_eq!(meta.background_color.len(), 6);
    assert_eq!(track.event_count, 6);
    assert_eq!(track.source_event, events[0]);
    assert_eq!(track.provenance.source_hash, events[0].content_hash);
}

#[test]
fn test_extreme_parameters_stay_in_range() {
    let events = event_batch(18_500_300, 10, 5e13);
    let mut params = ParameterDeriver::default()
        .derive_with_bucket(&events, 2, &FixedEntropy::new(0, 4))
        .unwrap();
    params.volume = 1.0;
    params.distortion = 1.0;
    params.reverb = 1.0;
    params.delay = 1.0;
    params.filter_cutoff = 1.0;
    params.patterns.kick.clear();
    params.patterns.snare.clear();
    params.patterns.hihat.clear();

    let buffer = Synthesizer::new(SynthConfig::preview(2.0))
        .unwrap()
        .synthesize(&params)
        .unwrap();
    assert_eq!(buffer.num_frames(), 88_200);
    assert!(buffer.samples.iter().any(|&s| s != 0));
    assert!(buffer.samples.iter().all(|&s| s != i16::MIN));
}

#[test]
fn test_duration_cap_bounds_buffer() {
    let events = event_batch(18_500_400, 3, 1e9);
    let mut params = ParameterDeriver::default()
        .derive_with_bucket(&events, 0, &FixedEntropy::new(0, 5))
        .unwrap();
    params.sections.intro = 200;
    params.sections.outro = 200;

    let synth = Synthesizer::new(SynthConfig::default()).unwrap();
    assert!(params.requested_duration_seconds() > MAX_DURATION_SECONDS);
    assert_eq!(
        synth.frame_count(&params),
        (MAX_DURATION_SECONDS * SAMPLE_RATE as f64) as u64
    );
}

#[test]
fn test_empty_buffer_is_rejected() {
    let events = event_batch(18_500_500, 2, 1e9);
    let params = ParameterDeriver::default()
        .derive_with_bucket(&events, 0, &FixedEntropy::new(0, 6))
        .unwrap();
    let err = Packager::default()
        .package(&events, &params, SampleBuffer::stereo(Vec::new()), 0)
        .unwrap_err();
    assert!(matches!(err, AudioError::EmptyArtifact));
    assert_eq!(err.category(), "audio");
}
