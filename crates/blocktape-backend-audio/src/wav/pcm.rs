//! PCM payload encoding, extraction, and hashing.

/// Encodes samples as little-endian 16-bit PCM.
pub fn pcm16_bytes(samples: &[i16]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        pcm.extend_from_slice(&sample.to_le_bytes());
    }
    pcm
}

/// BLAKE3 hash of the PCM encoding of `samples`.
pub fn pcm16_hash(samples: &[i16]) -> String {
    let mut hasher = blake3::Hasher::new();
    for &sample in samples {
        hasher.update(&sample.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Returns the `data` chunk of a RIFF/WAVE file, skipping other chunks.
pub fn extract_pcm_data(wav_data: &[u8]) -> Option<&[u8]> {
    if wav_data.len() < 12 || &wav_data[0..4] != b"RIFF" || &wav_data[8..12] != b"WAVE" {
        return None;
    }

    let mut pos = 12;
    while pos + 8 <= wav_data.len() {
        let chunk_id = &wav_data[pos..pos + 4];
        let chunk_size = u32::from_le_bytes([
            wav_data[pos + 4],
            wav_data[pos + 5],
            wav_data[pos + 6],
            wav_data[pos + 7],
        ]) as usize;

        if chunk_id == b"data" {
            let start = pos + 8;
            let end = start.checked_add(chunk_size)?;
            return wav_data.get(start..end);
        }

        // Chunks are word aligned.
        pos = pos.checked_add(8 + chunk_size + chunk_size % 2)?;
    }

    None
}

/// BLAKE3 hash of the PCM payload of a WAVE file.
pub fn compute_pcm_hash(wav_data: &[u8]) -> Option<String> {
    extract_pcm_data(wav_data).map(|pcm| blake3::hash(pcm).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm16_little_endian() {
        assert_eq!(pcm16_bytes(&[1, -1, 256]), vec![1, 0, 0xff, 0xff, 0, 1]);
    }

    #[test]
    fn test_streaming_hash_matches_bytes() {
        let samples = [0i16, 1, -2, 300, i16::MIN, i16::MAX];
        assert_eq!(
            pcm16_hash(&samples),
            blake3::hash(&pcm16_bytes(&samples)).to_hex().to_string()
        );
    }

    #[test]
    fn test_extract_skips_unknown_chunks() {
        let mut wav = Vec::new();
        wav.extend_from_slice(b"RIFF");
        wav.extend_from_slice(&0u32.to_le_bytes());
        wav.extend_from_slice(b"WAVE");
        wav.extend_from_slice(b"LIST");
        wav.extend_from_slice(&3u32.to_le_bytes());
        wav.extend_from_slice(&[1, 2, 3, 0]);
        wav.extend_from_slice(b"data");
        wav.extend_from_slice(&2u32.to_le_bytes());
        wav.extend_from_slice(&[9, 9]);

        assert_eq!(extract_pcm_data(&wav), Some(&[9u8, 9][..]));
    }

    #[test]
    fn test_extract_rejects_garbage() {
        assert_eq!(extract_pcm_data(b"not a wav file at all"), None);
        assert_eq!(compute_pcm_hash(&[]), None);
    }
}
