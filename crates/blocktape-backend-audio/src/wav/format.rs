//! WAVE format parameters.

use serde::Serialize;

/// Length of the canonical header written by this crate.
pub const HEADER_LEN: usize = 44;

/// Format written into the `fmt ` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    /// Always 16 for files written here.
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// 16-bit stereo at `sample_rate`.
    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    pub fn bytes_per_sample(&self) -> u16 {
        self.bits_per_sample / 8
    }

    /// Bytes per frame.
    pub fn block_align(&self) -> u16 {
        self.channels * self.bytes_per_sample()
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Header fields read back from a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WavInfo {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub byte_rate: u32,
    pub block_align: u16,
    /// Size of the `data` chunk in bytes.
    pub data_len: usize,
    /// Frames (samples per channel).
    pub num_frames: usize,
}

impl WavInfo {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.num_frames as f64 / self.sample_rate as f64
        }
    }
}
