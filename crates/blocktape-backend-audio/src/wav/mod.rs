//! RIFF/WAVE container.
//!
//! Tracks are written as canonical 44-byte-header, 16-bit PCM files with no
//! extra chunks, so the same samples always produce the same bytes.

mod format;
mod pcm;
mod reader;
mod writer;

pub use format::{WavFormat, WavInfo, HEADER_LEN};
pub use pcm::{compute_pcm_hash, extract_pcm_data, pcm16_bytes, pcm16_hash};
pub use reader::{decode_samples, parse_wav_header};
pub use writer::{buffer_to_wav, write_wav_to_vec};
