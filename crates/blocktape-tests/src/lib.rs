//! Blocktape End-to-End Test Infrastructure
//!
//! This crate provides integration tests across the workspace:
//!
//! - **Determinism**: same batch and time bucket give identical parameters
//!   and identical PCM
//! - **Generation**: batch -> parameters -> audio -> WAVE container and
//!   metadata, re-read with an independent decoder
//! - **Streaming**: session scenarios driven by a manual timer and clock
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p blocktape-tests
//! ```

pub mod determinism;
pub mod fixtures;

pub use determinism::{verify_determinism, DeterminismResult, DiffInfo};
