//! Inspect command implementation
//!
//! Parses a WAVE file's header and reports its format and payload hash.

use anyhow::{Context, Result};
use blocktape_backend_audio::wav::compute_pcm_hash;
use blocktape_backend_audio::{parse_wav_header, AudioError, WavInfo};
use blocktape_spec::BackendError;
use colored::Colorize;
use std::process::ExitCode;

use super::json_output::{error_codes, InspectOutput, InspectResult, JsonError};

/// Run the inspect command
///
/// # Returns
/// Exit code: 0 if the file is a valid container, 1 otherwise
pub fn run(input: &str, json_output: bool) -> Result<ExitCode> {
    if json_output {
        run_json(input)
    } else {
        run_human(input)
    }
}

fn run_human(input: &str) -> Result<ExitCode> {
    println!("{} {}", "Inspecting:".cyan().bold(), input);
    let data = std::fs::read(input).with_context(|| format!("Failed to read file: {}", input))?;
    let (info, pcm_hash) = inspect_bytes(&data)?;

    println!("  {} {}", "Channels:".dimmed(), info.channels);
    println!("  {} {} Hz", "Sample rate:".dimmed(), info.sample_rate);
    println!("  {} {}", "Bits per sample:".dimmed(), info.bits_per_sample);
    println!("  {} {}", "Byte rate:".dimmed(), info.byte_rate);
    println!("  {} {}", "Block align:".dimmed(), info.block_align);
    println!(
        "  {} {} frames ({:.3}s)",
        "Length:".dimmed(),
        info.num_frames,
        info.duration_seconds()
    );
    println!("  {} {}", "PCM hash:".dimmed(), pcm_hash);
    println!("{}", "Valid RIFF/WAVE container".green().bold());

    Ok(ExitCode::SUCCESS)
}

fn run_json(input: &str) -> Result<ExitCode> {
    let output = match std::fs::read(input) {
        Err(e) => InspectOutput {
            success: false,
            errors: vec![JsonError::new(error_codes::FILE_READ, e.to_string())],
            result: None,
        },
        Ok(data) => match inspect_bytes(&data) {
            Ok((info, pcm_hash)) => InspectOutput {
                success: true,
                errors: Vec::new(),
                result: Some(InspectResult {
                    path: input.to_string(),
                    duration_seconds: info.duration_seconds(),
                    info,
                    pcm_hash,
                }),
            },
            Err(e) => InspectOutput {
                success: false,
                errors: vec![JsonError::new(e.code(), e.to_string())],
                result: None,
            },
        },
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(if output.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

/// Header fields and the BLAKE3 hash of the PCM payload.
pub fn inspect_bytes(data: &[u8]) -> Result<(WavInfo, String), AudioError> {
    let info = parse_wav_header(data)?;
    let pcm_hash = compute_pcm_hash(data)
        .ok_or_else(|| AudioError::InvalidContainer("missing data chunk".into()))?;
    Ok((info, pcm_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blocktape_backend_audio::wav::buffer_to_wav;
    use blocktape_spec::SampleBuffer;

    #[test]
    fn test_inspect_bytes() {
        let wav = buffer_to_wav(&SampleBuffer::stereo(vec![0, 1, 2, 3, 4, 5]));
        let (info, hash) = inspect_bytes(&wav).unwrap();
        assert_eq!(info.num_frames, 3);
        assert_eq!(info.channels, 2);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_inspect_rejects_garbage() {
        assert!(inspect_bytes(b"not a wave file").is_err());
    }
}
