//! Snapshot collaborator interface and local implementations.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use blocktape_spec::hash::short_hash;
use blocktape_spec::{
    GeneratedTrack, MusicParameters, Provenance, SnapshotReceipt, TrackMetadata,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{StreamError, StreamResult};

/// Permanently records a generated track.
#[async_trait]
pub trait SnapshotArchiver: Send + Sync {
    async fn archive(&self, track: &GeneratedTrack) -> StreamResult<SnapshotReceipt>;
}

/// Accepts every snapshot without storing anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullArchiver;

#[async_trait]
impl SnapshotArchiver for NullArchiver {
    async fn archive(&self, track: &GeneratedTrack) -> StreamResult<SnapshotReceipt> {
        Ok(SnapshotReceipt {
            id: track.id.clone(),
            location_uri: format!("null://{}", track.id),
            transaction_ref: String::new(),
        })
    }
}

/// Sidecar written next to each archived WAV file.
#[derive(Debug, Serialize)]
pub struct ArchiveRecord<'a> {
    pub id: &'a str,
    pub created_at_ms: u64,
    pub duration_seconds: f64,
    pub metadata: &'a TrackMetadata,
    pub provenance: &'a Provenance,
    pub params: &'a MusicParameters,
}

impl<'a> ArchiveRecord<'a> {
    pub fn new(track: &'a GeneratedTrack) -> Self {
        Self {
            id: &track.id,
            created_at_ms: track.created_at_ms,
            duration_seconds: track.duration_seconds,
            metadata: &track.metadata,
            provenance: &track.provenance,
            params: &track.params,
        }
    }
}

/// Writes `<id>.wav` and `<id>.json` into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryArchiver {
    dir: PathBuf,
}

impl DirectoryArchiver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotArchiver for DirectoryArchiver {
    async fn archive(&self, track: &GeneratedTrack) -> StreamResult<SnapshotReceipt> {
        let archive_err = |e: std::io::Error| StreamError::Archive(format!("{}: {}", self.dir.display(), e));

        tokio::fs::create_dir_all(&self.dir).await.map_err(archive_err)?;

        let wav_path = self.dir.join(format!("{}.wav", track.id));
        let json_path = self.dir.join(format!("{}.json", track.id));
        let record = serde_json::to_vec_pretty(&ArchiveRecord::new(track))?;

        tokio::fs::write(&wav_path, &track.wav_data)
            .await
            .map_err(archive_err)?;
        tokio::fs::write(&json_path, record).await.map_err(archive_err)?;

        debug!(track_id = %track.short_id(), path = %wav_path.display(), "archived track");

        Ok(SnapshotReceipt {
            id: track.id.clone(),
            location_uri: format!("file://{}", wav_path.display()),
            transaction_ref: format!("local:{}", short_hash(&track.provenance.pcm_hash, 16)),
        })
    }
}
