//! Artifact packaging: container, id, metadata, and provenance.

mod metadata;

pub use metadata::{background_color, build_metadata};

use blocktape_spec::hash::{blake3_hash_str, canonical_hash};
use blocktape_spec::{
    GeneratedTrack, MusicParameters, Provenance, SampleBuffer, SourceEvent, GENERATOR_NAME,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AudioError, AudioResult};
use crate::wav::{buffer_to_wav, pcm16_hash};

/// Packaging options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageOptions {
    /// When set, tracks get `animation_url = "<base>/<id>.wav"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation_base_url: Option<String>,
}

/// Wraps rendered buffers into [`GeneratedTrack`]s.
#[derive(Debug, Clone, Default)]
pub struct Packager {
    options: PackageOptions,
}

impl Packager {
    pub fn new(options: PackageOptions) -> Self {
        Self { options }
    }

    /// Packages a buffer rendered from `params`.
    ///
    /// The first event of the batch is the primary event. Fails with
    /// [`AudioError::EmptyArtifact`] on an empty buffer.
    pub fn package(
        &self,
        events: &[SourceEvent],
        params: &MusicParameters,
        buffer: SampleBuffer,
        created_at_ms: u64,
    ) -> AudioResult<GeneratedTrack> {
        if buffer.is_empty() {
            return Err(AudioError::EmptyArtifact);
        }
        let primary = events
            .first()
            .ok_or_else(|| AudioError::invalid_param("events", "batch is empty"))?;

        let id = track_id(&primary.content_hash, &params.seed, created_at_ms);
        let duration_seconds = buffer.duration_seconds();
        let animation_url = self
            .options
            .animation_base_url
            .as_ref()
            .map(|base| format!("{}/{}.wav", base.trim_end_matches('/'), id));
        let metadata = build_metadata(
            primary,
            events.len(),
            params,
            duration_seconds,
            animation_url,
        );
        let provenance = Provenance {
            source_hash: primary.content_hash.clone(),
            params_hash: canonical_hash(params)?,
            pcm_hash: pcm16_hash(&buffer.samples),
            generator: GENERATOR_NAME.to_string(),
            generator_version: crate::VERSION.to_string(),
        };
        let wav_data = buffer_to_wav(&buffer);

        debug!(
            track_id = %id,
            bytes = wav_data.len(),
            duration_seconds,
            "packaged track"
        );

        Ok(GeneratedTrack {
            id,
            created_at_ms,
            source_event: primary.clone(),
            event_count: events.len(),
            params: params.clone(),
            buffer,
            wav_data,
            duration_seconds,
            metadata,
            provenance,
        })
    }
}

/// Content-derived track id: BLAKE3 of content hash, seed, and creation time.
pub fn track_id(content_hash: &str, seed: &str, created_at_ms: u64) -> String {
    blake3_hash_str(&format!("{}:{}:{}", content_hash, seed, created_at_ms))
}

/// Packages with default options.
pub fn package(
    events: &[SourceEvent],
    params: &MusicParameters,
    buffer: SampleBuffer,
    created_at_ms: u64,
) -> AudioResult<GeneratedTrack> {
    Packager::default().package(events, params, buffer, created_at_ms)
}
