//! Blocktape Streaming Session Manager
//!
//! This crate runs a continuous listening session on top of the music and
//! audio backends. A [`StreamingSessionManager`] owns at most one session.
//! On every tick it:
//!
//! 1. fetches the most recent events from an [`EventSource`]
//! 2. archives the playing track through a [`SnapshotArchiver`] when the
//!    batch's average cost crosses the snapshot threshold
//! 3. generates the next track when the current one is nearly over, or
//!    when batch activity changed sharply, and crossfades to it on the
//!    [`PlaybackSink`]
//!
//! Lifecycle changes are published on an [`EventBus`]. A listener that
//! panics is isolated from the others and from the session.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use blocktape_stream::{ReplayEventSource, StreamConfig, StreamingSessionManager};
//!
//! let source = Arc::new(ReplayEventSource::from_json_file("events.json")?);
//! let manager = StreamingSessionManager::builder(StreamConfig::default())
//!     .source(source)
//!     .build()?;
//! manager.subscribe(|event| println!("{}", event.kind()));
//! manager.start().await?;
//! ```
//!
//! # Module Structure
//!
//! - [`manager`]: Session lifecycle and the tick algorithm
//! - [`source`] / [`archive`] / [`playback`]: Collaborator traits and local implementations
//! - [`events`]: Lifecycle events and the listener registry
//! - [`timer`] / [`clock`]: Tick scheduling and a controllable clock
//! - [`config`]: Manager settings

pub mod archive;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod playback;
pub mod source;
pub mod timer;

pub use archive::{ArchiveRecord, DirectoryArchiver, NullArchiver, SnapshotArchiver};
pub use clock::ManualClock;
pub use config::StreamConfig;
pub use error::{StreamError, StreamResult};
pub use events::{EventBus, SessionEvent, Subscription};
pub use manager::{
    AdvanceReason, StreamingSessionManager, StreamingSessionManagerBuilder, TickOutcome,
};
pub use playback::{linear_crossfade, NullSink, PlaybackEvent, PlaybackSink, RecordingSink};
pub use source::{EventSource, ReplayEventSource};
pub use timer::{ManualTimer, TickTimer, TokioTimer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Component identifier.
pub const BACKEND_ID: &str = "blocktape-stream";
