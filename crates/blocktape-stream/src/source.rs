//! Upstream data source interface and a replaying implementation.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use blocktape_spec::SourceEvent;
use serde::Deserialize;

use crate::error::{StreamError, StreamResult};

/// Supplies batches of recent source events.
///
/// Retries, timeouts, and authentication are the implementor's concern. An
/// empty batch means "no new activity".
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Returns up to `count` recent events, ordered most-recent-last.
    async fn fetch_recent_events(&self, count: usize) -> StreamResult<Vec<SourceEvent>>;
}

/// Replay file layout: a list of batches, or a single batch.
#[derive(Deserialize)]
#[serde(untagged)]
enum ReplayFile {
    Batches(Vec<Vec<SourceEvent>>),
    Single(Vec<SourceEvent>),
}

/// Cycles through recorded batches, one per fetch.
#[derive(Debug, Default)]
pub struct ReplayEventSource {
    batches: Vec<Vec<SourceEvent>>,
    cursor: AtomicUsize,
}

impl ReplayEventSource {
    pub fn new(batches: Vec<Vec<SourceEvent>>) -> Self {
        Self {
            batches,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Loads batches from JSON: either `[[event, ...], ...]` or `[event, ...]`.
    pub fn from_json_file(path: impl AsRef<Path>) -> StreamResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let batches = match serde_json::from_str::<ReplayFile>(&content) {
            Ok(ReplayFile::Batches(batches)) => batches,
            Ok(ReplayFile::Single(batch)) => vec![batch],
            Err(e) => return Err(StreamError::DataSource(format!("invalid replay file: {}", e))),
        };
        Ok(Self::new(batches))
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

#[async_trait]
impl EventSource for ReplayEventSource {
    async fn fetch_recent_events(&self, count: usize) -> StreamResult<Vec<SourceEvent>> {
        if self.batches.is_empty() {
            return Ok(Vec::new());
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.batches.len();
        let batch = &self.batches[index];
        let skip = batch.len().saturating_sub(count);
        Ok(batch[skip..].to_vec())
    }
}
