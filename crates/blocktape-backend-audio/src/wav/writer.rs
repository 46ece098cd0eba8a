//! Container writing.

use blocktape_spec::SampleBuffer;

use super::format::{WavFormat, HEADER_LEN};
use super::pcm::pcm16_bytes;

/// Writes the 44-byte header for `data_len` bytes of PCM.
fn header(format: &WavFormat, data_len: u32) -> [u8; HEADER_LEN] {
    let mut h = [0u8; HEADER_LEN];
    h[0..4].copy_from_slice(b"RIFF");
    h[4..8].copy_from_slice(&(36u32.saturating_add(data_len)).to_le_bytes());
    h[8..12].copy_from_slice(b"WAVE");
    h[12..16].copy_from_slice(b"fmt ");
    h[16..20].copy_from_slice(&16u32.to_le_bytes());
    h[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    h[22..24].copy_from_slice(&format.channels.to_le_bytes());
    h[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    h[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    h[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    h[34..36].copy_from_slice(&format.bits_per_sample.to_le_bytes());
    h[36..40].copy_from_slice(b"data");
    h[40..44].copy_from_slice(&data_len.to_le_bytes());
    h
}

/// Builds a complete WAVE file in memory.
///
/// Payloads beyond the 32-bit size field are not representable; the size
/// fields saturate. Rendered tracks stay far below that.
pub fn write_wav_to_vec(format: &WavFormat, pcm_data: &[u8]) -> Vec<u8> {
    let data_len = u32::try_from(pcm_data.len()).unwrap_or(u32::MAX);
    let mut wav = Vec::with_capacity(HEADER_LEN + pcm_data.len());
    wav.extend_from_slice(&header(format, data_len));
    wav.extend_from_slice(pcm_data);
    wav
}

/// Wraps a sample buffer in a WAVE container.
pub fn buffer_to_wav(buffer: &SampleBuffer) -> Vec<u8> {
    let format = WavFormat {
        channels: buffer.channels,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
    };
    write_wav_to_vec(&format, &pcm16_bytes(&buffer.samples))
}
