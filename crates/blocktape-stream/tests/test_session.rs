//! Session lifecycle and tick behavior with controllable collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blocktape_backend_audio::SynthConfig;
use blocktape_spec::{GeneratedTrack, SessionState, SnapshotReceipt, SourceEvent};
use blocktape_stream::{
    AdvanceReason, EventSource, ManualClock, ManualTimer, PlaybackEvent, RecordingSink,
    ReplayEventSource, SessionEvent, SnapshotArchiver, StreamConfig, StreamError, StreamResult,
    StreamingSessionManager, TickOutcome,
};
use pretty_assertions::assert_eq;
use tokio::sync::Semaphore;

const START_MS: u64 = 1_700_000_000_000;

fn batch(start: u64, cost: f64) -> Vec<SourceEvent> {
    (start..start + 4)
        .map(|i| {
            SourceEvent::builder(i, format!("0x{:04x}", i))
                .timestamp(START_MS / 1000)
                .cost(cost)
                .flow(2.0)
                .build()
        })
        .collect()
}

fn config() -> StreamConfig {
    StreamConfig {
        crossfade_ms: 200,
        synth: SynthConfig::preview(1.0),
        ..StreamConfig::default()
    }
}

struct Harness {
    manager: StreamingSessionManager,
    clock: Arc<ManualClock>,
    sink: Arc<RecordingSink>,
    events: Arc<Mutex<Vec<SessionEvent>>>,
}

fn harness(config: StreamConfig, source: Arc<dyn EventSource>) -> Harness {
    harness_with(config, source, None)
}

fn harness_with(
    config: StreamConfig,
    source: Arc<dyn EventSource>,
    archiver: Option<Arc<dyn SnapshotArchiver>>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(START_MS, 7));
    let sink = Arc::new(RecordingSink::new());
    let mut builder = StreamingSessionManager::builder(config)
        .source(source)
        .sink(sink.clone())
        .timer(Arc::new(ManualTimer::new()))
        .entropy(clock.clone());
    if let Some(archiver) = archiver {
        builder = builder.archiver(archiver);
    }
    let manager = builder.build().unwrap();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink_events = events.clone();
    manager.subscribe(move |event| sink_events.lock().unwrap().push(event.clone()));

    Harness {
        manager,
        clock,
        sink,
        events,
    }
}

fn kinds(events: &Mutex<Vec<SessionEvent>>) -> Vec<&'static str> {
    events.lock().unwrap().iter().map(|e| e.kind()).collect()
}

/// Source whose fetches after the first wait for a permit.
struct GatedSource {
    batch: Vec<SourceEvent>,
    gate: Semaphore,
    calls: AtomicUsize,
}

#[async_trait]
impl EventSource for GatedSource {
    async fn fetch_recent_events(&self, _count: usize) -> StreamResult<Vec<SourceEvent>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) > 0 {
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| StreamError::DataSource(e.to_string()))?;
            permit.forget();
        }
        Ok(self.batch.clone())
    }
}

struct FailingArchiver;

#[async_trait]
impl SnapshotArchiver for FailingArchiver {
    async fn archive(&self, _track: &GeneratedTrack) -> StreamResult<SnapshotReceipt> {
        Err(StreamError::Archive("ledger unavailable".into()))
    }
}

#[tokio::test]
async fn test_start_plays_first_track() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));

    let session = h.manager.start().await.unwrap();
    assert!(session.is_active);
    assert_eq!(session.start_time_ms, START_MS);
    assert_eq!(session.stats.tracks_played, 1);
    assert_eq!(h.manager.state(), SessionState::Active);

    let current = session.current_track.unwrap();
    assert_eq!(current.duration_seconds, 1.0);
    assert_eq!(current.source_event.sequence, 1);

    assert_eq!(kinds(&h.events), vec!["session-started", "new-track"]);
    assert!(matches!(h.sink.events()[0], PlaybackEvent::Play { .. }));
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));
    let session = h.manager.start().await.unwrap();

    let err = h.manager.start().await.unwrap_err();
    match err {
        StreamError::AlreadyStreaming { session_id } => assert_eq!(session_id, session.id),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(h.manager.state(), SessionState::Active);
}

#[tokio::test]
async fn test_start_without_events_fails() {
    let h = harness(config(), Arc::new(ReplayEventSource::default()));
    let err = h.manager.start().await.unwrap_err();
    assert!(matches!(err, StreamError::DataSource(_)));
    assert_eq!(h.manager.state(), SessionState::Idle);
    assert!(h.manager.session().is_none());
}

#[tokio::test]
async fn test_advances_near_end_of_track() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));
    let first = h.manager.start().await.unwrap().current_track.unwrap();

    for _ in 0..8 {
        h.clock.advance(100);
        assert_eq!(
            h.manager.tick().await,
            TickOutcome::Held {
                snapshot_requested: false
            }
        );
    }

    h.clock.advance(100);
    let outcome = h.manager.tick().await;
    let TickOutcome::Advanced {
        track_id, reason, ..
    } = outcome
    else {
        panic!("expected advance, got {:?}", outcome);
    };
    assert_eq!(reason, AdvanceReason::TrackEnding);

    let session = h.manager.session().unwrap();
    let current = session.current_track.unwrap();
    assert_eq!(current.music_id, track_id);
    assert_ne!(current.music_id, first.music_id);
    assert_eq!(current.start_time_ms, START_MS + 900);
    assert_eq!(session.stats.tracks_played, 2);
    assert_eq!(session.stats.total_duration_seconds, 2.0);

    let kinds = kinds(&h.events);
    let fade = kinds.iter().position(|k| *k == "crossfade-started").unwrap();
    assert_eq!(kinds.last(), Some(&"new-track"));
    assert!(fade < kinds.len() - 1);

    let fades: Vec<_> = h
        .sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, PlaybackEvent::Crossfade { .. }))
        .collect();
    assert_eq!(fades.len(), 1);
    assert_eq!(h.sink.last_fade().unwrap().num_frames(), 8820);
}

#[tokio::test]
async fn test_activity_change_advances_early() {
    let source = ReplayEventSource::new(vec![batch(1, 1e9), batch(5, 2e9)]);
    let h = harness(config(), Arc::new(source));
    h.manager.start().await.unwrap();

    h.clock.advance(100);
    let outcome = h.manager.tick().await;
    assert!(
        matches!(
            outcome,
            TickOutcome::Advanced {
                reason: AdvanceReason::ActivityChanged,
                ..
            }
        ),
        "{:?}",
        outcome
    );
}

#[tokio::test]
async fn test_evolution_disabled_emits_no_evolution_events() {
    let source = ReplayEventSource::new(vec![batch(1, 1e9), batch(5, 2e9)]);
    let h = harness(
        StreamConfig {
            evolution_enabled: false,
            ..config()
        },
        Arc::new(source),
    );
    h.manager.start().await.unwrap();
    h.clock.advance(60_000);
    h.manager.tick().await;
    assert!(!kinds(&h.events).contains(&"configuration-evolved"));
}

#[tokio::test]
async fn test_snapshot_on_expensive_batch() {
    let h = harness(
        StreamConfig {
            snapshot_cost_threshold: 5e8,
            ..config()
        },
        Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])),
    );
    h.manager.start().await.unwrap();

    h.clock.advance(100);
    assert_eq!(
        h.manager.tick().await,
        TickOutcome::Held {
            snapshot_requested: true
        }
    );
    assert_eq!(
        kinds(&h.events)[2..].to_vec(),
        vec!["snapshot-requested", "snapshot-created"]
    );
    assert_eq!(h.manager.session().unwrap().snapshots.len(), 1);
}

#[tokio::test]
async fn test_archive_failure_keeps_session() {
    let h = harness_with(
        StreamConfig {
            snapshot_cost_threshold: 5e8,
            ..config()
        },
        Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])),
        Some(Arc::new(FailingArchiver)),
    );
    h.manager.start().await.unwrap();

    h.clock.advance(100);
    assert_eq!(
        h.manager.tick().await,
        TickOutcome::Held {
            snapshot_requested: true
        }
    );
    assert_eq!(h.manager.state(), SessionState::Active);

    let events = h.events.lock().unwrap().clone();
    let error = events
        .iter()
        .find_map(|e| match e {
            SessionEvent::StreamingError { code, message } => Some((code.clone(), message.clone())),
            _ => None,
        })
        .unwrap();
    assert_eq!(error.0, "STREAM_004");
    assert!(error.1.contains("ledger unavailable"));
    assert!(h.manager.session().unwrap().snapshots.is_empty());

    assert!(matches!(
        h.manager.snapshot_now().await,
        Err(StreamError::Archive(_))
    ));
}

#[tokio::test]
async fn test_overlapping_tick_is_skipped() {
    let source = Arc::new(GatedSource {
        batch: batch(1, 1e9),
        gate: Semaphore::new(0),
        calls: AtomicUsize::new(0),
    });
    let h = harness(config(), source.clone());
    h.manager.start().await.unwrap();

    let manager = h.manager.clone();
    let first = tokio::spawn(async move { manager.tick().await });
    while source.calls.load(Ordering::SeqCst) < 2 {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.manager.tick().await, TickOutcome::Skipped);

    source.gate.add_permits(1);
    assert_eq!(
        first.await.unwrap(),
        TickOutcome::Held {
            snapshot_requested: false
        }
    );
}

#[tokio::test]
async fn test_snapshot_now_requires_session() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));
    assert!(matches!(
        h.manager.snapshot_now().await,
        Err(StreamError::SessionNotActive)
    ));

    h.manager.start().await.unwrap();
    let receipt = h.manager.snapshot_now().await.unwrap();
    assert!(receipt.location_uri.starts_with("null://"));
}

#[tokio::test]
async fn test_panicking_listener_is_isolated() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));
    h.manager.subscribe(|_| panic!("listener bug"));

    h.manager.start().await.unwrap();
    assert_eq!(h.manager.state(), SessionState::Active);
    assert_eq!(kinds(&h.events), vec!["session-started", "new-track"]);
}

#[tokio::test]
async fn test_listener_counts() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));
    assert!(matches!(
        h.manager.listener_joined(),
        Err(StreamError::SessionNotActive)
    ));

    h.manager.start().await.unwrap();
    assert_eq!(h.manager.listener_joined().unwrap(), 1);
    assert_eq!(h.manager.listener_joined().unwrap(), 2);
    assert_eq!(h.manager.listener_left().unwrap(), 1);
    assert_eq!(h.manager.listener_left().unwrap(), 0);
    assert_eq!(h.manager.listener_left().unwrap(), 0);

    let stats = h.manager.session().unwrap().stats;
    assert_eq!(stats.listeners, 0);
    assert_eq!(stats.peak_listeners, 2);
}

#[tokio::test]
async fn test_stop_ends_session() {
    let h = harness(config(), Arc::new(ReplayEventSource::new(vec![batch(1, 1e9)])));
    h.manager.start().await.unwrap();

    h.clock.advance(5_000);
    let session = h.manager.stop().await.unwrap();
    assert!(!session.is_active);
    assert_eq!(session.end_time_ms, Some(START_MS + 5_000));
    assert_eq!(h.manager.state(), SessionState::Stopped);
    assert!(h.manager.current_track().is_none());

    assert_eq!(h.manager.tick().await, TickOutcome::NotActive);
    assert!(matches!(
        h.manager.stop().await,
        Err(StreamError::SessionNotActive)
    ));
    assert_eq!(kinds(&h.events).last(), Some(&"session-ended"));
    assert_eq!(h.sink.events().last(), Some(&PlaybackEvent::Stop));

    // A stopped manager can start a fresh session.
    let next = h.manager.start().await.unwrap();
    assert_ne!(next.id, session.id);
}
