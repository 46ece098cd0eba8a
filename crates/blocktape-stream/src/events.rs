//! Typed publish/subscribe for session lifecycle events.
//!
//! Each listener call runs inside its own unwind boundary: a panicking
//! listener is logged and skipped, and neither the emitter nor the other
//! listeners are affected.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use blocktape_backend_music::Evolution;
use blocktape_spec::SnapshotReceipt;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::warn;

/// Something observable that happened in a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionStarted {
        session_id: String,
        start_time_ms: u64,
    },
    NewTrack {
        session_id: String,
        track_id: String,
        sequence: u64,
        duration_seconds: f64,
    },
    CrossfadeStarted {
        from_track: String,
        to_track: String,
        duration_ms: u64,
    },
    SnapshotRequested {
        track_id: String,
    },
    SnapshotCreated {
        track_id: String,
        receipt: SnapshotReceipt,
    },
    ConfigurationEvolved {
        evolution: Evolution,
    },
    StreamingError {
        code: String,
        message: String,
    },
    SessionEnded {
        session_id: String,
        end_time_ms: u64,
        tracks_played: u64,
    },
}

impl SessionEvent {
    /// Short kebab-case name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "session-started",
            SessionEvent::NewTrack { .. } => "new-track",
            SessionEvent::CrossfadeStarted { .. } => "crossfade-started",
            SessionEvent::SnapshotRequested { .. } => "snapshot-requested",
            SessionEvent::SnapshotCreated { .. } => "snapshot-created",
            SessionEvent::ConfigurationEvolved { .. } => "configuration-evolved",
            SessionEvent::StreamingError { .. } => "streaming-error",
            SessionEvent::SessionEnded { .. } => "session-ended",
        }
    }
}

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// Handle returned by [`EventBus::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Fan-out of [`SessionEvent`]s to registered listeners.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(Subscription, Listener)>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let subscription = Subscription(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((subscription, Arc::new(listener)));
        subscription
    }

    /// Registers a listener that forwards every event into a channel.
    pub fn subscribe_channel(&self) -> (Subscription, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |event| {
            // Receiver gone: nothing left to deliver to.
            let _ = tx.send(event.clone());
        });
        (subscription, rx)
    }

    /// Removes a listener. Returns false if it was not registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(s, _)| *s != subscription);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    /// Delivers `event` to every listener. Returns how many listeners panicked.
    pub fn emit(&self, event: &SessionEvent) -> usize {
        // Listeners run without the lock held so they may (un)subscribe.
        let listeners: Vec<(Subscription, Listener)> = self.lock().clone();
        let mut failures = 0;
        for (subscription, listener) in listeners {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                failures += 1;
                warn!(
                    listener = subscription.0,
                    event = event.kind(),
                    panic = panic_message(panic.as_ref()),
                    "session event listener panicked"
                );
            }
        }
        failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(Subscription, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic>"
    }
}
