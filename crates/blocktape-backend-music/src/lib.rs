//! Blocktape Music Backend - Parameter Derivation
//!
//! This crate turns a batch of source events into a deterministic
//! [`MusicParameters`](blocktape_spec::MusicParameters) set: tempo from the
//! average cost, swing from cost jitter, key and scale from the primary
//! event's identifiers, and catalogue patterns picked by content hash and
//! time bucket.
//!
//! # Determinism
//!
//! For a fixed batch and time bucket, derivation yields identical
//! parameters except the random suffix of the seed. Time and randomness
//! are injected through [`EntropySource`], so tests substitute
//! [`FixedEntropy`].
//!
//! # Example
//!
//! ```
//! use blocktape_backend_music::{FixedEntropy, ParameterDeriver};
//! use blocktape_spec::SourceEvent;
//!
//! let events: Vec<SourceEvent> = (0..10)
//!     .map(|i| SourceEvent::builder(i, "0xabc").cost(5e9).flow(21_000.0).build())
//!     .collect();
//!
//! let deriver = ParameterDeriver::default();
//! let params = deriver
//!     .derive_with_bucket(&events, 0, &FixedEntropy::new(0, 42))
//!     .unwrap();
//!
//! assert!(params.tempo >= 70.0 && params.tempo <= 80.0);
//! assert_eq!(params.octave_range, (1, 3));
//! ```
//!
//! # Module Structure
//!
//! - [`catalogue`]: Hand-authored progressions, melodies, and rhythm tables
//! - [`config`]: Derivation tuning
//! - [`derive`]: Main derivation entry point
//! - [`entropy`]: Injected clock and random source
//! - [`evolve`]: Gradual parameter drift for streaming sessions

pub mod catalogue;
pub mod config;
pub mod derive;
pub mod entropy;
pub mod error;
pub mod evolve;

pub use config::DeriveConfig;
pub use derive::{derive, ParameterDeriver, OCTAVE_RANGE};
pub use entropy::{time_bucket, EntropySource, FixedEntropy, SystemEntropy};
pub use error::{DeriveError, DeriveResult};
pub use evolve::Evolution;

/// Crate version for backend identification.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Backend identifier.
pub const BACKEND_ID: &str = "blocktape-backend-music";
