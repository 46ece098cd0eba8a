//! CLI argument definitions for the `blocktape` command-line interface.

use clap::{Parser, Subcommand};

/// Blocktape - procedural lo-fi tracks from source event activity
#[derive(Parser)]
#[command(name = "blocktape")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Derive music parameters from an event batch and print them as JSON
    Derive {
        /// Path to the event batch (JSON)
        #[arg(short, long)]
        events: String,

        /// Pin the time bucket instead of using the current one
        #[arg(long)]
        time_bucket: Option<u64>,

        /// Seed for the randomized fields (swing jitter)
        #[arg(long)]
        seed: Option<u64>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Generate a track (WAV plus metadata JSON) from an event batch
    Generate {
        /// Path to the event batch (JSON)
        #[arg(short, long)]
        events: String,

        /// Output directory (default: current directory)
        #[arg(short, long)]
        out_dir: Option<String>,

        /// Pin the time bucket instead of using the current one
        #[arg(long)]
        time_bucket: Option<u64>,

        /// Seed for the randomized fields (swing jitter)
        #[arg(long)]
        seed: Option<u64>,

        /// Render only the first N seconds
        #[arg(long)]
        preview: Option<f64>,

        /// Base URL for the metadata animation_url field
        #[arg(long)]
        animation_base_url: Option<String>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Parse a WAV file header and print its format and PCM hash
    Inspect {
        /// Path to the WAV file
        #[arg(short, long)]
        input: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Run a streaming session over a replay file of event batches
    Stream {
        /// Path to the replay file (JSON list of batches, or one batch)
        #[arg(short, long)]
        events: String,

        /// Session configuration file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Directory receiving snapshots
        #[arg(long)]
        archive_dir: Option<String>,

        /// Stop after N ticks (default: run until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,

        /// Tick interval in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Render only the first N seconds of each track
        #[arg(long)]
        preview: Option<f64>,

        /// Average batch cost above which the playing track is snapshotted
        #[arg(long)]
        snapshot_threshold: Option<f64>,
    },
}
