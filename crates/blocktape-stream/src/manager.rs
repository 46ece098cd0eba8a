//! The streaming session manager.
//!
//! A manager owns at most one [`StreamingSession`]. Each tick fetches a batch,
//! decides whether to snapshot the playing track, and decides whether to
//! generate the next one. Generation runs on the blocking pool; session state
//! is only written after a new track has rendered, packaged, and finished its
//! crossfade, so readers never see a half-updated session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use blocktape_backend_audio::{Packager, Synthesizer};
use blocktape_backend_music::{EntropySource, Evolution, ParameterDeriver, SystemEntropy};
use blocktape_spec::hash::{blake3_hash_str, short_hash};
use blocktape_spec::{
    BackendError, BatchStats, CurrentTrack, GeneratedTrack, SessionState, SnapshotReceipt,
    SourceEvent, StreamingSession,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::archive::{NullArchiver, SnapshotArchiver};
use crate::config::StreamConfig;
use crate::error::{StreamError, StreamResult};
use crate::events::{EventBus, SessionEvent, Subscription};
use crate::playback::{NullSink, PlaybackSink};
use crate::source::EventSource;
use crate::timer::{TickTimer, TokioTimer};

/// Why a tick started a new track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceReason {
    /// The current track reached the configured progress.
    TrackEnding,
    /// Batch cost or flow moved by at least the configured ratio.
    ActivityChanged,
}

/// Result of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Another tick was still running.
    Skipped,
    /// No session is streaming.
    NotActive,
    /// The current track keeps playing.
    Held { snapshot_requested: bool },
    /// A new track replaced the current one.
    Advanced {
        track_id: String,
        reason: AdvanceReason,
        snapshot_requested: bool,
    },
    /// The tick failed; a `StreamingError` event was emitted and the session
    /// continues unchanged.
    Failed { error: String },
}

/// Mutable state behind the manager's lock.
#[derive(Debug)]
struct Core {
    state: SessionState,
    session: Option<StreamingSession>,
    current: Option<Arc<GeneratedTrack>>,
    last_batch: Vec<SourceEvent>,
    last_stats: Option<BatchStats>,
    evolution: Evolution,
    ticks: u64,
}

impl Core {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            session: None,
            current: None,
            last_batch: Vec::new(),
            last_stats: None,
            evolution: Evolution::default(),
            ticks: 0,
        }
    }

    fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }
}

struct Inner {
    config: StreamConfig,
    deriver: ParameterDeriver,
    synth: Synthesizer,
    packager: Packager,
    source: Arc<dyn EventSource>,
    archiver: Arc<dyn SnapshotArchiver>,
    sink: Arc<dyn PlaybackSink>,
    timer: Arc<dyn TickTimer>,
    entropy: Arc<dyn EntropySource>,
    bus: EventBus,
    core: Mutex<Core>,
    tick_in_flight: AtomicBool,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

/// Builder for [`StreamingSessionManager`].
pub struct StreamingSessionManagerBuilder {
    config: StreamConfig,
    source: Option<Arc<dyn EventSource>>,
    archiver: Arc<dyn SnapshotArchiver>,
    sink: Arc<dyn PlaybackSink>,
    timer: Option<Arc<dyn TickTimer>>,
    entropy: Arc<dyn EntropySource>,
}

impl StreamingSessionManagerBuilder {
    /// Data source; required.
    pub fn source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Snapshot collaborator; defaults to [`NullArchiver`].
    pub fn archiver(mut self, archiver: Arc<dyn SnapshotArchiver>) -> Self {
        self.archiver = archiver;
        self
    }

    /// Playback sink; defaults to [`NullSink`].
    pub fn sink(mut self, sink: Arc<dyn PlaybackSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Tick timer; defaults to a [`TokioTimer`] at the configured interval.
    pub fn timer(mut self, timer: Arc<dyn TickTimer>) -> Self {
        self.timer = Some(timer);
        self
    }

    /// Clock and randomness; defaults to [`SystemEntropy`].
    pub fn entropy(mut self, entropy: Arc<dyn EntropySource>) -> Self {
        self.entropy = entropy;
        self
    }

    pub fn build(self) -> StreamResult<StreamingSessionManager> {
        self.config.validate()?;
        let source = self
            .source
            .ok_or_else(|| StreamError::Config("an event source is required".into()))?;
        let timer = self.timer.unwrap_or_else(|| {
            Arc::new(TokioTimer::new(self.config.tick_interval())) as Arc<dyn TickTimer>
        });

        Ok(StreamingSessionManager {
            inner: Arc::new(Inner {
                deriver: ParameterDeriver::new(self.config.derive.clone())?,
                synth: Synthesizer::new(self.config.synth.clone())?,
                packager: Packager::new(self.config.package.clone()),
                config: self.config,
                source,
                archiver: self.archiver,
                sink: self.sink,
                timer,
                entropy: self.entropy,
                bus: EventBus::new(),
                core: Mutex::new(Core::new()),
                tick_in_flight: AtomicBool::new(false),
                tick_task: Mutex::new(None),
            }),
        })
    }
}

/// Clears the in-flight flag when a tick ends, including on early return.
struct TickGuard<'a>(&'a AtomicBool);

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Long-lived orchestrator of one streaming session at a time.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct StreamingSessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StreamingSessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingSessionManager")
            .field("state", &self.state())
            .finish()
    }
}

impl StreamingSessionManager {
    pub fn builder(config: StreamConfig) -> StreamingSessionManagerBuilder {
        StreamingSessionManagerBuilder {
            config,
            source: None,
            archiver: Arc::new(NullArchiver),
            sink: Arc::new(NullSink),
            timer: None,
            entropy: Arc::new(SystemEntropy::new()),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.inner.config
    }

    /// Event bus for lifecycle events.
    pub fn events(&self) -> &EventBus {
        &self.inner.bus
    }

    /// Shorthand for `events().subscribe(listener)`.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.inner.bus.subscribe(listener)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// Snapshot of the session, if one has been started.
    pub fn session(&self) -> Option<StreamingSession> {
        self.lock().session.clone()
    }

    /// The track currently playing.
    pub fn current_track(&self) -> Option<Arc<GeneratedTrack>> {
        self.lock().current.clone()
    }

    /// Starts a session: generates and plays the first track, then starts
    /// the tick loop.
    pub async fn start(&self) -> StreamResult<StreamingSession> {
        {
            let mut core = self.lock();
            if core.state.is_streaming()
                || matches!(core.state, SessionState::Starting | SessionState::Stopping)
            {
                return Err(StreamError::AlreadyStreaming {
                    session_id: core.session_id().unwrap_or_default().to_string(),
                });
            }
            core.state = SessionState::Starting;
        }

        match self.open_session().await {
            Ok(session) => {
                self.spawn_tick_loop();
                Ok(session)
            }
            Err(err) => {
                self.lock().state = SessionState::Idle;
                warn!(error = %err, "failed to start streaming session");
                Err(err)
            }
        }
    }

    async fn open_session(&self) -> StreamResult<StreamingSession> {
        let inner = &self.inner;
        let now = inner.entropy.now_ms();
        let session_id = short_hash(
            &blake3_hash_str(&format!("{}:{}", now, inner.entropy.random())),
            16,
        )
        .to_string();

        let batch = inner
            .source
            .fetch_recent_events(inner.config.fetch_count)
            .await?;
        if batch.is_empty() {
            return Err(StreamError::DataSource(
                "no events available for the first track".into(),
            ));
        }

        let track = self.generate(batch.clone(), Evolution::default()).await?;
        inner.sink.play(&track).await?;

        let mut session = StreamingSession::new(session_id.clone(), now);
        session.current_track = Some(current_descriptor(&track, now));
        session.stats.tracks_played = 1;
        session.stats.total_duration_seconds = track.duration_seconds;

        {
            let mut core = self.lock();
            core.state = SessionState::Active;
            core.session = Some(session.clone());
            core.current = Some(track.clone());
            core.last_stats = Some(BatchStats::from_events(&batch));
            core.last_batch = batch;
            core.evolution = Evolution::default();
            core.ticks = 0;
        }

        info!(
            session_id = %session_id,
            track_id = %track.short_id(),
            "streaming session started"
        );
        inner.bus.emit(&SessionEvent::SessionStarted {
            session_id: session_id.clone(),
            start_time_ms: now,
        });
        inner.bus.emit(&new_track_event(&session_id, &track));

        Ok(session)
    }

    fn spawn_tick_loop(&self) {
        let timer = self.inner.timer.clone();
        timer.reset();
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            while timer.next_tick().await {
                let Some(inner) = weak.upgrade() else { break };
                let manager = StreamingSessionManager { inner };
                if let TickOutcome::NotActive = manager.tick().await {
                    break;
                }
            }
        });
        let previous = self
            .inner
            .tick_task
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    /// Runs one tick. Overlapping calls return [`TickOutcome::Skipped`].
    pub async fn tick(&self) -> TickOutcome {
        if self.inner.tick_in_flight.swap(true, Ordering::AcqRel) {
            warn!("tick skipped: previous tick still running");
            return TickOutcome::Skipped;
        }
        let _guard = TickGuard(&self.inner.tick_in_flight);
        self.run_tick().await
    }

    async fn run_tick(&self) -> TickOutcome {
        let inner = &self.inner;
        let (session_id, current, previous_batch, previous_stats, evolution, tick) = {
            let mut core = self.lock();
            if core.state != SessionState::Active {
                return TickOutcome::NotActive;
            }
            let (Some(session), Some(current)) = (core.session.as_ref(), core.current.clone())
            else {
                return TickOutcome::NotActive;
            };
            let session_id = session.id.clone();
            core.ticks += 1;
            (
                session_id,
                current,
                core.last_batch.clone(),
                core.last_stats,
                core.evolution,
                core.ticks,
            )
        };

        // (a) fetch; an empty batch reuses the previous one and counts as no change.
        let (batch, fresh) = match inner
            .source
            .fetch_recent_events(inner.config.fetch_count)
            .await
        {
            Ok(batch) if !batch.is_empty() => (batch, true),
            Ok(_) => {
                debug!(tick, "data source returned no events; reusing previous batch");
                (previous_batch, false)
            }
            Err(err) => return self.fail(err),
        };
        let stats = BatchStats::from_events(&batch);
        let change = match (fresh, previous_stats) {
            (true, Some(previous)) => stats.relative_change(&previous),
            _ => 0.0,
        };

        // (b) snapshot trigger
        let snapshot_requested = if stats.average_cost > inner.config.snapshot_cost_threshold {
            self.snapshot_track(&session_id, &current).await;
            true
        } else {
            false
        };

        // (c) advance trigger
        let now = inner.entropy.now_ms();
        let progress = {
            let core = self.lock();
            core.session
                .as_ref()
                .and_then(|s| s.current_track.as_ref())
                .map_or(1.0, |t| t.progress(now))
        };
        let reason = if progress >= inner.config.advance_progress {
            Some(AdvanceReason::TrackEnding)
        } else if change >= inner.config.advance_change_ratio {
            Some(AdvanceReason::ActivityChanged)
        } else {
            None
        };

        debug!(
            session_id = %session_id,
            tick,
            progress,
            change,
            average_cost = stats.average_cost,
            "tick"
        );

        let Some(reason) = reason else {
            let mut core = self.lock();
            if core.state == SessionState::Active {
                core.last_batch = batch;
                core.last_stats = Some(stats);
            }
            return TickOutcome::Held { snapshot_requested };
        };

        {
            let mut core = self.lock();
            if core.state != SessionState::Active {
                return TickOutcome::NotActive;
            }
            core.state = SessionState::Generating;
        }

        let next_evolution = if inner.config.evolution_enabled {
            let elapsed = {
                let core = self.lock();
                core.session.as_ref().map_or(0.0, |s| s.elapsed_seconds(now))
            };
            let activity = inner.deriver.activity(&stats);
            let next = evolution.step(elapsed, activity, inner.config.evolution_max_step);
            if next != evolution {
                inner
                    .bus
                    .emit(&SessionEvent::ConfigurationEvolved { evolution: next });
            }
            next
        } else {
            evolution
        };

        let track = match self.generate(batch.clone(), next_evolution).await {
            Ok(track) => track,
            Err(err) => {
                self.restore_active();
                return self.fail(err);
            }
        };

        inner.bus.emit(&SessionEvent::CrossfadeStarted {
            from_track: current.id.clone(),
            to_track: track.id.clone(),
            duration_ms: inner.config.crossfade_ms,
        });
        if let Err(err) = inner
            .sink
            .crossfade(&current, &track, inner.config.crossfade())
            .await
        {
            self.restore_active();
            return self.fail(err);
        }

        let started_at = inner.entropy.now_ms();
        {
            let mut core = self.lock();
            let same_session = core.session_id() == Some(session_id.as_str());
            if core.state != SessionState::Generating || !same_session {
                // Stopped while generating; the result is discarded.
                return TickOutcome::NotActive;
            }
            if let Some(session) = core.session.as_mut() {
                session.current_track = Some(current_descriptor(&track, started_at));
                session.stats.tracks_played += 1;
                session.stats.total_duration_seconds += track.duration_seconds;
            }
            core.current = Some(track.clone());
            core.last_batch = batch;
            core.last_stats = Some(stats);
            core.evolution = next_evolution;
            core.state = SessionState::Active;
        }

        info!(
            session_id = %session_id,
            track_id = %track.short_id(),
            reason = ?reason,
            "new track"
        );
        inner.bus.emit(&new_track_event(&session_id, &track));

        TickOutcome::Advanced {
            track_id: track.id.clone(),
            reason,
            snapshot_requested,
        }
    }

    /// Archives the current track now.
    ///
    /// Fails with [`StreamError::SessionNotActive`] when nothing is
    /// streaming. Archive failures are returned and also emitted as
    /// `StreamingError` events.
    pub async fn snapshot_now(&self) -> StreamResult<SnapshotReceipt> {
        let (session_id, current) = {
            let core = self.lock();
            match (core.state.is_streaming(), core.session_id(), core.current.clone()) {
                (true, Some(id), Some(current)) => (id.to_string(), current),
                _ => return Err(StreamError::SessionNotActive),
            }
        };
        self.archive(&session_id, &current).await
    }

    /// Stops the session. Returns the final session state.
    ///
    /// No further ticks start. A tick already generating finishes in the
    /// background and its track is discarded.
    pub async fn stop(&self) -> StreamResult<StreamingSession> {
        {
            let mut core = self.lock();
            if !core.state.is_streaming() {
                return Err(StreamError::SessionNotActive);
            }
            core.state = SessionState::Stopping;
        }

        self.inner.timer.cancel();
        self.inner.sink.stop().await;

        let end = self.inner.entropy.now_ms();
        let session = {
            let mut core = self.lock();
            core.state = SessionState::Stopped;
            core.current = None;
            let session = core.session.as_mut().ok_or(StreamError::SessionNotActive)?;
            session.is_active = false;
            session.end_time_ms = Some(end);
            session.clone()
        };

        info!(
            session_id = %session.id,
            tracks_played = session.stats.tracks_played,
            "streaming session ended"
        );
        self.inner.bus.emit(&SessionEvent::SessionEnded {
            session_id: session.id.clone(),
            end_time_ms: end,
            tracks_played: session.stats.tracks_played,
        });
        Ok(session)
    }

    /// Records a listener joining; returns the new listener count.
    pub fn listener_joined(&self) -> StreamResult<u32> {
        let mut core = self.lock();
        let session = active_session(&mut core)?;
        session.stats.listeners += 1;
        session.stats.peak_listeners = session.stats.peak_listeners.max(session.stats.listeners);
        Ok(session.stats.listeners)
    }

    /// Records a listener leaving; returns the new listener count.
    pub fn listener_left(&self) -> StreamResult<u32> {
        let mut core = self.lock();
        let session = active_session(&mut core)?;
        session.stats.listeners = session.stats.listeners.saturating_sub(1);
        Ok(session.stats.listeners)
    }

    /// Derives, renders, and packages a track off the async executor.
    async fn generate(
        &self,
        batch: Vec<SourceEvent>,
        evolution: Evolution,
    ) -> StreamResult<Arc<GeneratedTrack>> {
        let inner = self.inner.clone();
        let rendered = tokio::task::spawn_blocking(move || -> StreamResult<GeneratedTrack> {
            let params = inner.deriver.derive(&batch, inner.entropy.as_ref())?;
            let config = inner.deriver.config();
            let params = if evolution.is_neutral() {
                params
            } else {
                evolution.apply(&params, (config.tempo_min, config.tempo_max))
            };
            let buffer = inner.synth.synthesize(&params)?;
            let track = inner
                .packager
                .package(&batch, &params, buffer, inner.entropy.now_ms())?;
            Ok(track)
        })
        .await
        .map_err(|e| StreamError::Generation(format!("render task failed: {}", e)))??;
        Ok(Arc::new(rendered))
    }

    async fn snapshot_track(&self, session_id: &str, track: &GeneratedTrack) {
        // Failures are already reported through the event bus.
        let _ = self.archive(session_id, track).await;
    }

    async fn archive(
        &self,
        session_id: &str,
        track: &GeneratedTrack,
    ) -> StreamResult<SnapshotReceipt> {
        self.inner.bus.emit(&SessionEvent::SnapshotRequested {
            track_id: track.id.clone(),
        });
        match self.inner.archiver.archive(track).await {
            Ok(receipt) => {
                {
                    let mut core = self.lock();
                    if let Some(session) = core.session.as_mut().filter(|s| s.id == session_id) {
                        session.snapshots.push(receipt.id.clone());
                    }
                }
                info!(
                    session_id,
                    track_id = %track.short_id(),
                    location = %receipt.location_uri,
                    "snapshot created"
                );
                self.inner.bus.emit(&SessionEvent::SnapshotCreated {
                    track_id: track.id.clone(),
                    receipt: receipt.clone(),
                });
                Ok(receipt)
            }
            Err(err) => {
                let err = match err {
                    StreamError::Archive(_) => err,
                    other => StreamError::Archive(other.to_string()),
                };
                self.report(&err);
                Err(err)
            }
        }
    }

    fn restore_active(&self) {
        let mut core = self.lock();
        if core.state == SessionState::Generating {
            core.state = SessionState::Active;
        }
    }

    fn report(&self, err: &StreamError) {
        warn!(code = err.code(), error = %err, "streaming error");
        self.inner.bus.emit(&SessionEvent::StreamingError {
            code: err.code().to_string(),
            message: err.to_string(),
        });
    }

    fn fail(&self, err: StreamError) -> TickOutcome {
        self.report(&err);
        TickOutcome::Failed {
            error: err.to_string(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Core> {
        self.inner.core.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn active_session(core: &mut Core) -> StreamResult<&mut StreamingSession> {
    if !core.state.is_streaming() {
        return Err(StreamError::SessionNotActive);
    }
    core.session.as_mut().ok_or(StreamError::SessionNotActive)
}

fn current_descriptor(track: &GeneratedTrack, start_time_ms: u64) -> CurrentTrack {
    CurrentTrack {
        music_id: track.id.clone(),
        start_time_ms,
        duration_seconds: track.duration_seconds,
        source_event: track.source_event.clone(),
    }
}

fn new_track_event(session_id: &str, track: &GeneratedTrack) -> SessionEvent {
    SessionEvent::NewTrack {
        session_id: session_id.to_string(),
        track_id: track.id.clone(),
        sequence: track.source_event.sequence,
        duration_seconds: track.duration_seconds,
    }
}
