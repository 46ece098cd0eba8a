//! Blocktape data model
//!
//! This crate provides the types shared by every Blocktape component:
//! source events, musical parameters, generated tracks, and streaming
//! session state, together with batch validation, music theory helpers,
//! and canonical hashing.
//!
//! # Example
//!
//! ```
//! use blocktape_spec::{SourceEvent, BatchStats};
//! use blocktape_spec::validation::validate_batch;
//!
//! let batch: Vec<SourceEvent> = (0..3)
//!     .map(|i| {
//!         SourceEvent::builder(100 + i, "0xabc")
//!             .cost(5e9)
//!             .flow(21_000.0)
//!             .build()
//!     })
//!     .collect();
//!
//! assert!(validate_batch(&batch).is_ok());
//! assert_eq!(BatchStats::from_events(&batch).count, 3);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Validation errors and the shared backend error trait
//! - [`event`]: Source events and batch statistics
//! - [`hash`]: Canonical hashing and seed derivation
//! - [`params`]: Musical parameter set
//! - [`session`]: Streaming session state
//! - [`theory`]: Pitch classes, modes, chord symbols
//! - [`track`]: Sample buffers, generated tracks, metadata
//! - [`validation`]: Batch validation

pub mod error;
pub mod event;
pub mod hash;
pub mod params;
pub mod session;
pub mod theory;
pub mod track;
pub mod validation;

// Re-export commonly used types at the crate root
pub use error::{
    BackendError, ErrorCode, GenerationError, SpecError, ValidationError, ValidationResult,
};
pub use event::{BatchStats, SourceEvent, SourceEventBuilder};
pub use hash::{canonical_hash, derive_component_seed, select_index};
pub use params::{
    FeatureFlags, MusicParameters, RhythmPatterns, SectionLengths, TimeSignature, DEFAULT_BASS,
    DEFAULT_HIHAT, DEFAULT_KICK, DEFAULT_SNARE,
};
pub use session::{CurrentTrack, SessionState, SessionStats, SnapshotReceipt, StreamingSession};
pub use theory::{Chord, ChordQuality, PitchClass, ScaleMode, TheoryError};
pub use track::{
    Attribute, AttributeValue, GeneratedTrack, Provenance, SampleBuffer, TrackMetadata,
    CHANNELS, MAX_DURATION_SECONDS, SAMPLE_RATE,
};
pub use validation::validate_batch;

/// Generator name recorded in provenance blocks.
pub const GENERATOR_NAME: &str = "blocktape";
