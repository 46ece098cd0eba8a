//! Streaming session state shared between the session manager and its readers.
//!
//! The manager owns the only mutable [`StreamingSession`]; readers receive
//! clones.

use serde::{Deserialize, Serialize};

use crate::event::SourceEvent;

/// Lifecycle state of a session manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    Active,
    /// Active, with a track generation in flight.
    Generating,
    Stopping,
    Stopped,
}

impl SessionState {
    /// True for states in which the session is streaming.
    pub fn is_streaming(self) -> bool {
        matches!(self, SessionState::Active | SessionState::Generating)
    }

    /// Returns the state name as a string.
    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Starting => "starting",
            SessionState::Active => "active",
            SessionState::Generating => "generating",
            SessionState::Stopping => "stopping",
            SessionState::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of the track currently playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentTrack {
    /// Id of the generated track.
    pub music_id: String,
    /// When playback began (unix ms).
    pub start_time_ms: u64,
    /// Declared duration in seconds.
    pub duration_seconds: f64,
    pub source_event: SourceEvent,
}

impl CurrentTrack {
    /// Fraction of the declared duration played at `now_ms` (not clamped).
    pub fn progress(&self, now_ms: u64) -> f64 {
        if self.duration_seconds <= 0.0 {
            return 1.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_time_ms) as f64 / 1000.0;
        elapsed / self.duration_seconds
    }
}

/// Running statistics for a session.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub listeners: u32,
    pub peak_listeners: u32,
    pub tracks_played: u64,
    /// Sum of declared durations of all played tracks, in seconds.
    pub total_duration_seconds: f64,
}

/// Mutable state of one streaming session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingSession {
    pub id: String,
    pub start_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<u64>,
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_track: Option<CurrentTrack>,
    pub stats: SessionStats,
    /// Receipt ids of snapshots created during the session.
    pub snapshots: Vec<String>,
}

impl StreamingSession {
    /// Creates an active session with empty statistics.
    pub fn new(id: impl Into<String>, start_time_ms: u64) -> Self {
        Self {
            id: id.into(),
            start_time_ms,
            end_time_ms: None,
            is_active: true,
            current_track: None,
            stats: SessionStats::default(),
            snapshots: Vec::new(),
        }
    }

    /// Wall-clock session length at `now_ms` (or at the end time if stopped).
    pub fn elapsed_seconds(&self, now_ms: u64) -> f64 {
        let end = self.end_time_ms.unwrap_or(now_ms);
        end.saturating_sub(self.start_time_ms) as f64 / 1000.0
    }
}

/// Receipt returned by the archival collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotReceipt {
    pub id: String,
    pub location_uri: String,
    pub transaction_ref: String,
}
