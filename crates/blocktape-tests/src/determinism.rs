//! Byte-level determinism checks.
//!
//! ```rust,ignore
//! use blocktape_tests::verify_determinism;
//!
//! let result = verify_determinism(|| render(&params).wav_data, 3);
//! result.assert_deterministic();
//! ```

use std::fmt;

use blocktape_spec::hash::blake3_hash;

/// Result of running a generator several times.
#[derive(Debug, Clone)]
pub struct DeterminismResult {
    /// Whether all runs produced identical output.
    pub is_deterministic: bool,
    pub runs: usize,
    /// Size of the first run's output in bytes.
    pub output_size: usize,
    /// BLAKE3 hash of the first run's output.
    pub hash: String,
    /// First difference found, if any.
    pub diff_info: Option<DiffInfo>,
}

/// First byte difference between the first run and a later one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInfo {
    /// Byte offset of the difference (or the shorter length on a size mismatch).
    pub offset: usize,
    pub expected: Option<u8>,
    pub actual: Option<u8>,
    /// Which run (0-indexed) differed.
    pub run_index: usize,
}

impl fmt::Display for DiffInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |b: Option<u8>| b.map_or_else(|| "EOF".to_string(), |b| format!("0x{:02X}", b));
        write!(
            f,
            "difference at byte {}: expected {}, got {} (run {})",
            self.offset,
            byte(self.expected),
            byte(self.actual),
            self.run_index
        )
    }
}

impl DeterminismResult {
    /// Panics with the first difference if the runs disagreed.
    pub fn assert_deterministic(&self) {
        if let Some(diff) = &self.diff_info {
            panic!(
                "output is not deterministic over {} runs: {}",
                self.runs, diff
            );
        }
    }
}

/// Runs `generate` `runs` times and compares every output with the first.
pub fn verify_determinism<F>(mut generate: F, runs: usize) -> DeterminismResult
where
    F: FnMut() -> Vec<u8>,
{
    let runs = runs.max(2);
    let first = generate();
    let hash = blake3_hash(&first);

    for run_index in 1..runs {
        let output = generate();
        if let Some(offset) = first_difference(&first, &output) {
            return DeterminismResult {
                is_deterministic: false,
                runs,
                output_size: first.len(),
                hash,
                diff_info: Some(DiffInfo {
                    offset,
                    expected: first.get(offset).copied(),
                    actual: output.get(offset).copied(),
                    run_index,
                }),
            };
        }
    }

    DeterminismResult {
        is_deterministic: true,
        runs,
        output_size: first.len(),
        hash,
        diff_info: None,
    }
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}
