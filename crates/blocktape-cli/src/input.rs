//! Loading source event batches from JSON files.
//!
//! Two layouts are accepted: a single batch (`[event, ...]`) or a list of
//! batches (`[[event, ...], ...]`) as recorded for replay.

use anyhow::{bail, Context, Result};
use blocktape_spec::hash::blake3_hash;
use blocktape_spec::SourceEvent;
use serde::Deserialize;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum EventFile {
    Single(Vec<SourceEvent>),
    Batches(Vec<Vec<SourceEvent>>),
}

/// Batches read from an event file.
#[derive(Debug)]
pub struct LoadResult {
    /// Every batch in file order. Never empty.
    pub batches: Vec<Vec<SourceEvent>>,
    /// BLAKE3 hash of the file content (hex string).
    pub source_hash: String,
}

impl LoadResult {
    /// The first batch; used by the one-shot commands.
    pub fn first_batch(&self) -> &[SourceEvent] {
        self.batches.first().map(Vec::as_slice).unwrap_or_default()
    }
}

/// Reads an event file.
pub fn load_events(path: &Path) -> Result<LoadResult> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;
    let source_hash = blake3_hash(&content);

    let parsed: EventFile = serde_json::from_slice(&content)
        .with_context(|| format!("Failed to parse event file: {}", path.display()))?;
    let batches = match parsed {
        EventFile::Single(batch) => vec![batch],
        EventFile::Batches(batches) => batches,
    };
    if batches.iter().all(Vec::is_empty) {
        bail!("event file contains no events: {}", path.display());
    }

    Ok(LoadResult {
        batches,
        source_hash,
    })
}
