//! Generated track artifacts: sample buffers, metadata, and provenance.

use serde::{Deserialize, Serialize};

use crate::event::SourceEvent;
use crate::params::MusicParameters;

/// Fixed output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Fixed output channel count.
pub const CHANNELS: u16 = 2;

/// Hard cap on rendered track length in seconds.
pub const MAX_DURATION_SECONDS: f64 = 300.0;

/// Interleaved 16-bit stereo PCM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    /// Interleaved samples (L, R, L, R, ...).
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of interleaved channels.
    pub channels: u16,
}

impl SampleBuffer {
    /// Creates a stereo buffer at the fixed sample rate.
    pub fn stereo(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
        }
    }

    /// Number of sample frames (samples per channel).
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    /// Returns true if the buffer has no frames.
    pub fn is_empty(&self) -> bool {
        self.num_frames() == 0
    }

    /// Duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.num_frames() as f64 / self.sample_rate as f64
        }
    }

    /// Size of the PCM payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.samples.len() * 2
    }

    /// Returns one frame as (left, right), or `None` past the end.
    pub fn frame(&self, index: usize) -> Option<(i16, i16)> {
        let base = index.checked_mul(self.channels as usize)?;
        match self.channels {
            1 => self.samples.get(base).map(|&s| (s, s)),
            _ => Some((*self.samples.get(base)?, *self.samples.get(base + 1)?)),
        }
    }
}

/// Attribute value: text or number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Number(f64),
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Number(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        AttributeValue::Number(value as f64)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Text(if value { "Yes" } else { "No" }.to_string())
    }
}

/// One `{trait_type, value}` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub trait_type: String,
    pub value: AttributeValue,
}

impl Attribute {
    /// Creates an attribute.
    pub fn new(trait_type: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self {
            trait_type: trait_type.into(),
            value: value.into(),
        }
    }
}

/// NFT-style descriptive metadata consumed by the archival collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    pub name: String,
    pub description: String,
    pub attributes: Vec<Attribute>,
    /// Hex color without the leading `#`.
    pub background_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_url: Option<String>,
}

impl TrackMetadata {
    /// Looks up an attribute by trait name.
    pub fn attribute(&self, trait_type: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.trait_type == trait_type)
            .map(|a| &a.value)
    }
}

/// Where a track came from and what produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Content hash of the primary source event.
    pub source_hash: String,
    /// Canonical hash of the music parameters.
    pub params_hash: String,
    /// BLAKE3 hash of the PCM payload.
    pub pcm_hash: String,
    /// Generator name.
    pub generator: String,
    /// Generator version.
    pub generator_version: String,
}

/// A packaged, immutable track.
#[derive(Debug, Clone)]
pub struct GeneratedTrack {
    /// Content-derived unique id (64 hex chars).
    pub id: String,
    /// Creation time in unix milliseconds.
    pub created_at_ms: u64,
    /// Primary source event.
    pub source_event: SourceEvent,
    /// Number of events in the originating batch.
    pub event_count: usize,
    pub params: MusicParameters,
    /// Raw interleaved PCM.
    pub buffer: SampleBuffer,
    /// Complete RIFF/WAVE container bytes.
    pub wav_data: Vec<u8>,
    /// Rendered duration in seconds (capped).
    pub duration_seconds: f64,
    pub metadata: TrackMetadata,
    pub provenance: Provenance,
}

impl GeneratedTrack {
    /// First 8 characters of the id, for logs and file names.
    pub fn short_id(&self) -> &str {
        crate::hash::short_hash(&self.id, 8)
    }
}
