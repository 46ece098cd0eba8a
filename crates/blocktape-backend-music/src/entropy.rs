//! Injected sources of time and randomness.
//!
//! Derivation is pure apart from two inputs: the current time (which picks
//! the time bucket) and one random draw (the seed suffix). Both come from an
//! [`EntropySource`] so tests can pin them.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Supplies wall-clock time and uniform random numbers.
pub trait EntropySource: Send + Sync {
    /// Current time in unix milliseconds.
    fn now_ms(&self) -> u64;

    /// A uniform random number in `[0, 1)`.
    fn random(&self) -> f64;
}

/// Maps a timestamp to its coarse time bucket.
///
/// ```text
/// time_bucket = floor(now_ms / interval_ms)
/// ```
///
/// A zero interval collapses everything into bucket 0.
pub fn time_bucket(now_ms: u64, interval_ms: u64) -> u64 {
    if interval_ms == 0 {
        0
    } else {
        now_ms / interval_ms
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// System clock plus a PCG32 stream seeded from the clock at construction.
#[derive(Debug)]
pub struct SystemEntropy {
    rng: Mutex<Pcg32>,
}

impl SystemEntropy {
    /// Creates a new system entropy source.
    pub fn new() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self {
            rng: Mutex::new(Pcg32::seed_from_u64(nanos)),
        }
    }
}

impl Default for SystemEntropy {
    fn default() -> Self {
        Self::new()
    }
}

impl EntropySource for SystemEntropy {
    fn now_ms(&self) -> u64 {
        unix_now_ms()
    }

    fn random(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen()
    }
}

/// Pinned time plus a seeded PCG32 stream, for reproducible derivation.
#[derive(Debug)]
pub struct FixedEntropy {
    now_ms: u64,
    rng: Mutex<Pcg32>,
}

impl FixedEntropy {
    /// Creates an entropy source frozen at `now_ms` with a seeded random stream.
    pub fn new(now_ms: u64, seed: u64) -> Self {
        Self {
            now_ms,
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }
}

impl EntropySource for FixedEntropy {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn random(&self) -> f64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen()
    }
}
