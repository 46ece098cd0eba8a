//! Entropy selection shared by the one-shot commands.

use blocktape_backend_music::{EntropySource, FixedEntropy, SystemEntropy};

/// System entropy, or a fixed PCG32 stream when `seed` is given.
///
/// The clock always comes from the system; pin `--time-bucket` as well for
/// fully reproducible output.
pub(crate) fn select(seed: Option<u64>) -> Box<dyn EntropySource> {
    let system = SystemEntropy::new();
    match seed {
        Some(seed) => Box::new(FixedEntropy::new(system.now_ms(), seed)),
        None => Box::new(system),
    }
}
