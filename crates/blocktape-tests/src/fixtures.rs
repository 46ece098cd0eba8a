//! Shared fixtures: event batches, scripted collaborators, and event capture.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blocktape_backend_audio::SynthConfig;
use blocktape_spec::{GeneratedTrack, SnapshotReceipt, SourceEvent};
use blocktape_stream::{
    EventSource, SessionEvent, SnapshotArchiver, StreamConfig, StreamError, StreamResult,
    StreamingSessionManager,
};

/// Unix seconds used as the base timestamp of fixture events.
pub const BASE_TIMESTAMP: u64 = 1_700_000_000;

/// `len` chained events starting at `start_sequence`, all with `cost`.
///
/// Origins rotate over three addresses and flows grow with the index, so
/// batches look like real activity without tripping validation.
pub fn event_batch(start_sequence: u64, len: u64, cost: f64) -> Vec<SourceEvent> {
    let mut parent = String::new();
    (0..len)
        .map(|i| {
            let event = SourceEvent::builder(start_sequence + i, format!("0xorigin{}", i % 3))
                .parent_hash(parent.clone())
                .timestamp(BASE_TIMESTAMP + (start_sequence + i) * 12)
                .cost(cost)
                .flow(21_000.0 + i as f64 * 1_000.0)
                .destination("0xdest")
                .value(format!("{}", i * 1_000_000))
                .build();
            parent = event.content_hash.clone();
            event
        })
        .collect()
}

/// Stream settings with short preview renders and a fast crossfade.
pub fn preview_config(track_seconds: f64) -> StreamConfig {
    StreamConfig {
        crossfade_ms: 250,
        synth: SynthConfig::preview(track_seconds),
        ..StreamConfig::default()
    }
}

/// Archiver that always fails and counts attempts.
#[derive(Debug, Default)]
pub struct FailingArchiver {
    attempts: AtomicUsize,
}

impl FailingArchiver {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotArchiver for FailingArchiver {
    async fn archive(&self, track: &GeneratedTrack) -> StreamResult<SnapshotReceipt> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StreamError::Archive(format!(
            "archival service rejected {}",
            track.short_id()
        )))
    }
}

/// What a [`ScriptedSource`] does on one fetch.
#[derive(Debug, Clone)]
pub enum Fetch {
    Batch(Vec<SourceEvent>),
    Empty,
    Fail(String),
}

/// Data source that plays a script of fetch results, repeating the last step.
#[derive(Debug)]
pub struct ScriptedSource {
    steps: Vec<Fetch>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Fetch>) -> Self {
        Self {
            steps,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    async fn fetch_recent_events(&self, count: usize) -> StreamResult<Vec<SourceEvent>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(call)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or(Fetch::Empty);
        match step {
            Fetch::Batch(batch) => {
                let skip = batch.len().saturating_sub(count);
                Ok(batch[skip..].to_vec())
            }
            Fetch::Empty => Ok(Vec::new()),
            Fetch::Fail(message) => Err(StreamError::DataSource(message)),
        }
    }
}

/// Captures every event a manager emits.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

impl EventLog {
    /// Subscribes a new log to `manager`.
    pub fn attach(manager: &StreamingSessionManager) -> Self {
        let log = Self::default();
        let events = log.events.clone();
        manager.subscribe(move |event| {
            events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event.clone())
        });
        log
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(SessionEvent::kind).collect()
    }

    pub fn count(&self, kind: &str) -> usize {
        self.kinds().iter().filter(|k| **k == kind).count()
    }
}
