//! Manually advanced clock for deterministic sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use blocktape_backend_music::EntropySource;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// [`EntropySource`] whose time only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicU64,
    rng: Mutex<Pcg32>,
}

impl ManualClock {
    pub fn new(start_ms: u64, seed: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
            rng: Mutex::new(Pcg32::seed_from_u64(seed)),
        }
    }

    /// Moves time forward by `ms`.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }
}

impl EntropySource for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn random(&self) -> f64 {
        self.rng.lock().unwrap_or_else(|e| e.into_inner()).gen()
    }
}
