//! Container parsing.

use crate::error::{AudioError, AudioResult};

use super::format::WavInfo;
use super::pcm::extract_pcm_data;

fn u16_at(data: &[u8], pos: usize) -> Option<u16> {
    Some(u16::from_le_bytes([*data.get(pos)?, *data.get(pos + 1)?]))
}

fn u32_at(data: &[u8], pos: usize) -> Option<u32> {
    Some(u32::from_le_bytes([
        *data.get(pos)?,
        *data.get(pos + 1)?,
        *data.get(pos + 2)?,
        *data.get(pos + 3)?,
    ]))
}

/// Reads the `fmt ` and `data` chunk headers of a 16-bit PCM WAVE file.
pub fn parse_wav_header(wav_data: &[u8]) -> AudioResult<WavInfo> {
    let invalid = |msg: &str| AudioError::InvalidContainer(msg.to_string());

    if wav_data.len() < 12 || &wav_data[0..4] != b"RIFF" || &wav_data[8..12] != b"WAVE" {
        return Err(invalid("missing RIFF/WAVE signature"));
    }

    let mut pos = 12;
    let mut fmt_pos = None;
    while pos + 8 <= wav_data.len() {
        let size = u32_at(wav_data, pos + 4).ok_or_else(|| invalid("truncated chunk header"))?;
        if &wav_data[pos..pos + 4] == b"fmt " {
            fmt_pos = Some(pos + 8);
            break;
        }
        pos += 8 + size as usize + size as usize % 2;
    }
    let fmt = fmt_pos.ok_or_else(|| invalid("missing fmt chunk"))?;

    let audio_format = u16_at(wav_data, fmt).ok_or_else(|| invalid("truncated fmt chunk"))?;
    if audio_format != 1 {
        return Err(AudioError::InvalidContainer(format!(
            "unsupported audio format {}",
            audio_format
        )));
    }
    let channels = u16_at(wav_data, fmt + 2).ok_or_else(|| invalid("truncated fmt chunk"))?;
    let sample_rate = u32_at(wav_data, fmt + 4).ok_or_else(|| invalid("truncated fmt chunk"))?;
    let byte_rate = u32_at(wav_data, fmt + 8).ok_or_else(|| invalid("truncated fmt chunk"))?;
    let block_align = u16_at(wav_data, fmt + 12).ok_or_else(|| invalid("truncated fmt chunk"))?;
    let bits_per_sample =
        u16_at(wav_data, fmt + 14).ok_or_else(|| invalid("truncated fmt chunk"))?;

    if bits_per_sample != 16 {
        return Err(AudioError::InvalidContainer(format!(
            "unsupported bit depth {}",
            bits_per_sample
        )));
    }
    if channels == 0 || block_align != channels * 2 {
        return Err(invalid("inconsistent block alignment"));
    }

    let data = extract_pcm_data(wav_data).ok_or_else(|| invalid("missing or truncated data chunk"))?;

    Ok(WavInfo {
        channels,
        sample_rate,
        bits_per_sample,
        byte_rate,
        block_align,
        data_len: data.len(),
        num_frames: data.len() / block_align as usize,
    })
}

/// Decodes the interleaved 16-bit samples of a WAVE file.
pub fn decode_samples(wav_data: &[u8]) -> AudioResult<Vec<i16>> {
    parse_wav_header(wav_data)?;
    let data = extract_pcm_data(wav_data)
        .ok_or_else(|| AudioError::InvalidContainer("missing data chunk".to_string()))?;
    Ok(data
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect())
}
