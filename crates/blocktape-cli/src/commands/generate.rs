//! Generate command implementation
//!
//! Derives parameters from an event batch, renders the track, and writes
//! `<id>.wav` plus an `<id>.json` metadata sidecar.

use anyhow::{Context, Result};
use blocktape_backend_audio::{PackageOptions, Packager, SynthConfig, Synthesizer};
use blocktape_backend_music::{DeriveConfig, EntropySource, ParameterDeriver};
use blocktape_spec::{GeneratedTrack, GenerationError, SourceEvent};
use blocktape_stream::ArchiveRecord;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use super::json_output::{error_codes, GenerateOutput, GenerateResult, JsonError};
use crate::input::load_events;

/// Options for one generate run.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Output directory (default: current directory)
    pub out_dir: Option<String>,
    /// Pinned time bucket
    pub time_bucket: Option<u64>,
    /// Seed for the randomized fields
    pub seed: Option<u64>,
    /// Render only the first N seconds
    pub preview: Option<f64>,
    /// Base URL for the metadata `animation_url`
    pub animation_base_url: Option<String>,
}

/// Files written for one track.
struct Written {
    track: GeneratedTrack,
    wav_path: PathBuf,
    metadata_path: PathBuf,
}

/// Run the generate command
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(events_path: &str, options: &GenerateOptions, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(events_path, options)
    } else {
        run_human(events_path, options)
    }
}

fn run_human(events_path: &str, options: &GenerateOptions) -> Result<ExitCode> {
    let start = Instant::now();
    println!("{} {}", "Generating from:".cyan().bold(), events_path);
    if let Some(seconds) = options.preview {
        println!("{} first {:.1}s", "Preview:".dimmed(), seconds);
    }

    let loaded = load_events(Path::new(events_path))?;
    println!(
        "{} {} events ({})",
        "Source:".dimmed(),
        loaded.first_batch().len(),
        &loaded.source_hash[..16]
    );

    let written = generate_track(loaded.first_batch(), options)?;
    let params = &written.track.params;

    println!(
        "  {} {} {} at {:.1} BPM, {}, swing {:.2}",
        "~".cyan(),
        params.key,
        params.scale,
        params.tempo,
        params.time_signature,
        params.swing
    );
    println!(
        "  {} {}",
        "Chords:".dimmed(),
        params.chord_progression.join(" - ")
    );
    println!(
        "  {} {} ({:.1}s)",
        "+".green(),
        written.wav_path.display(),
        written.track.duration_seconds
    );
    println!("  {} {}", "+".green(), written.metadata_path.display());
    println!(
        "{} {} in {:?}",
        "Generated".green().bold(),
        written.track.metadata.name,
        start.elapsed()
    );

    Ok(ExitCode::SUCCESS)
}

fn run_json(events_path: &str, options: &GenerateOptions) -> Result<ExitCode> {
    let start = Instant::now();

    let loaded = match load_events(Path::new(events_path)) {
        Ok(loaded) => loaded,
        Err(e) => {
            let output = GenerateOutput {
                success: false,
                errors: vec![JsonError::new(error_codes::INPUT, format!("{:#}", e))],
                result: None,
                source_hash: None,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(ExitCode::from(1));
        }
    };

    let (output, code) = match generate_track(loaded.first_batch(), options) {
        Ok(written) => {
            let track = &written.track;
            let result = GenerateResult {
                track_id: track.id.clone(),
                wav_path: written.wav_path.display().to_string(),
                metadata_path: written.metadata_path.display().to_string(),
                duration_seconds: track.duration_seconds,
                tempo: track.params.tempo,
                key: track.params.key.to_string(),
                scale: track.params.scale.to_string(),
                time_bucket: track.params.time_bucket,
                params_hash: track.provenance.params_hash.clone(),
                pcm_hash: track.provenance.pcm_hash.clone(),
                preview: options.preview.is_some(),
                duration_ms: start.elapsed().as_millis() as u64,
            };
            (
                GenerateOutput {
                    success: true,
                    errors: Vec::new(),
                    result: Some(result),
                    source_hash: Some(loaded.source_hash),
                },
                ExitCode::SUCCESS,
            )
        }
        Err(e) => (
            GenerateOutput {
                success: false,
                errors: vec![json_error(&e)],
                result: None,
                source_hash: Some(loaded.source_hash),
            },
            ExitCode::from(1),
        ),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}

/// Derive, render, package, and write one track.
fn generate_track(events: &[SourceEvent], options: &GenerateOptions) -> Result<Written> {
    let entropy = super::entropy::select(options.seed);
    let track = render_track(events, options, entropy.as_ref())?;

    let out_dir = PathBuf::from(options.out_dir.as_deref().unwrap_or("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create output directory: {}", out_dir.display()))?;

    let wav_path = out_dir.join(format!("{}.wav", track.id));
    let metadata_path = out_dir.join(format!("{}.json", track.id));
    std::fs::write(&wav_path, &track.wav_data)
        .with_context(|| format!("Failed to write {}", wav_path.display()))?;
    let record = serde_json::to_vec_pretty(&ArchiveRecord::new(&track))?;
    std::fs::write(&metadata_path, record)
        .with_context(|| format!("Failed to write {}", metadata_path.display()))?;

    Ok(Written {
        track,
        wav_path,
        metadata_path,
    })
}

/// Derive, render, and package one track in memory.
///
/// Backend failures keep their code and category.
fn render_track(
    events: &[SourceEvent],
    options: &GenerateOptions,
    entropy: &dyn EntropySource,
) -> Result<GeneratedTrack, GenerationError> {
    let deriver =
        ParameterDeriver::new(DeriveConfig::default()).map_err(GenerationError::from_backend)?;
    let params = match options.time_bucket {
        Some(bucket) => deriver.derive_with_bucket(events, bucket, entropy),
        None => deriver.derive(events, entropy),
    }
    .map_err(GenerationError::from_backend)?;

    let synth_config = match options.preview {
        Some(seconds) => SynthConfig::preview(seconds),
        None => SynthConfig::default(),
    };
    let buffer = Synthesizer::new(synth_config)
        .and_then(|synth| synth.synthesize(&params))
        .map_err(GenerationError::from_backend)?;

    let packager = Packager::new(PackageOptions {
        animation_base_url: options.animation_base_url.clone(),
    });
    packager
        .package(events, &params, buffer, entropy.now_ms())
        .map_err(GenerationError::from_backend)
}

/// JSON error for a failed run: the backend's own code when there is one.
fn json_error(err: &anyhow::Error) -> JsonError {
    if let Some(e) = err.downcast_ref::<GenerationError>() {
        JsonError::from_generation(e)
    } else if err.downcast_ref::<std::io::Error>().is_some() {
        JsonError::new(error_codes::OUTPUT, format!("{:#}", err))
    } else {
        JsonError::new(error_codes::GENERATION_ERROR, format!("{:#}", err))
    }
}
