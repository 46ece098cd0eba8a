//! Blocktape CLI library.
//!
//! This crate provides the command implementations behind the `blocktape`
//! binary: one-shot parameter derivation and track generation, WAVE
//! inspection, and a streaming session runner.

pub mod commands;
pub mod input;
pub mod logging;
