//! Derive command implementation
//!
//! Derives music parameters from an event batch and prints them as JSON.

use anyhow::{Context, Result};
use blocktape_backend_music::{DeriveConfig, ParameterDeriver};
use std::path::Path;
use std::process::ExitCode;

use crate::input::load_events;

/// Run the derive command
///
/// # Arguments
/// * `events_path` - Path to the event batch JSON
/// * `time_bucket` - Optional pinned time bucket (default: current bucket)
/// * `seed` - Optional seed for the randomized fields
/// * `output` - Optional output file (default: stdout)
///
/// # Returns
/// Exit code: 0 success, 1 error
pub fn run(
    events_path: &str,
    time_bucket: Option<u64>,
    seed: Option<u64>,
    output: Option<&str>,
) -> Result<ExitCode> {
    let loaded = load_events(Path::new(events_path))?;
    let deriver = ParameterDeriver::new(DeriveConfig::default())?;
    let entropy = super::entropy::select(seed);

    let params = match time_bucket {
        Some(bucket) => deriver.derive_with_bucket(loaded.first_batch(), bucket, entropy.as_ref()),
        None => deriver.derive(loaded.first_batch(), entropy.as_ref()),
    }
    .context("Failed to derive parameters")?;

    let json = params.to_json_pretty()?;
    match output {
        Some(path) => std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write parameters: {}", path))?,
        None => println!("{}", json),
    }

    Ok(ExitCode::SUCCESS)
}
