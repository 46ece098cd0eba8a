//! Stream command implementation
//!
//! Runs a streaming session over a replay file. Without `--ticks` the
//! session ticks on its own timer until Ctrl+C; with `--ticks N` the command
//! drives exactly N ticks at the configured interval and stops.

use anyhow::{Context, Result};
use blocktape_stream::{
    DirectoryArchiver, ManualTimer, NullArchiver, ReplayEventSource, SessionEvent,
    SnapshotArchiver, StreamConfig, StreamingSessionManager, TickOutcome,
};
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

use crate::input::load_events;

/// Options for one stream run.
#[derive(Debug, Clone, Default)]
pub struct StreamOptions {
    /// JSON configuration file
    pub config: Option<String>,
    /// Directory receiving snapshots (default: snapshots are discarded)
    pub archive_dir: Option<String>,
    /// Number of ticks to run before stopping
    pub ticks: Option<u64>,
    /// Override of the tick interval in milliseconds
    pub tick_ms: Option<u64>,
    /// Render only the first N seconds of each track
    pub preview: Option<f64>,
    /// Override of the snapshot cost threshold
    pub snapshot_threshold: Option<f64>,
}

/// Run the stream command
///
/// # Returns
/// Exit code: 0 after a clean stop, 1 error
pub fn run(events_path: &str, options: &StreamOptions) -> Result<ExitCode> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run_session(events_path, options))
}

/// Applies file and flag settings on top of the defaults.
pub fn build_config(options: &StreamOptions) -> Result<StreamConfig> {
    let mut config = match &options.config {
        Some(path) => StreamConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config: {}", path))?,
        None => StreamConfig::default(),
    };
    if let Some(ms) = options.tick_ms {
        config.tick_interval_ms = ms;
    }
    if let Some(seconds) = options.preview {
        config.synth.preview_seconds = Some(seconds);
    }
    if let Some(threshold) = options.snapshot_threshold {
        config.snapshot_cost_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

async fn run_session(events_path: &str, options: &StreamOptions) -> Result<ExitCode> {
    let config = build_config(options)?;
    let loaded = load_events(Path::new(events_path))?;

    println!("{} {}", "Streaming from:".cyan().bold(), events_path);
    println!(
        "{} {} batches, tick every {:?}",
        "Source:".dimmed(),
        loaded.batches.len(),
        config.tick_interval()
    );

    let archiver: Arc<dyn SnapshotArchiver> = match &options.archive_dir {
        Some(dir) => {
            println!("{} {}", "Archive:".dimmed(), dir);
            Arc::new(DirectoryArchiver::new(dir))
        }
        None => Arc::new(NullArchiver),
    };

    let tick_interval = config.tick_interval();
    let mut builder = StreamingSessionManager::builder(config)
        .source(Arc::new(ReplayEventSource::new(loaded.batches)))
        .archiver(archiver);
    if options.ticks.is_some() {
        builder = builder.timer(Arc::new(ManualTimer::new()));
    }
    let manager = builder.build()?;

    let (subscription, mut events) = manager.events().subscribe_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    manager.start().await.context("Failed to start session")?;

    match options.ticks {
        Some(ticks) => {
            let mut interval = tokio::time::interval(tick_interval);
            interval.tick().await;
            for _ in 0..ticks {
                tokio::select! {
                    _ = interval.tick() => {
                        if manager.tick().await == TickOutcome::NotActive {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Received Ctrl+C, stopping session");
                        break;
                    }
                }
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for Ctrl+C")?;
            info!("Received Ctrl+C, stopping session");
        }
    }

    let session = manager.stop().await?;
    manager.events().unsubscribe(subscription);
    let _ = printer.await;

    println!(
        "{} {} tracks, {:.1}s of audio, {} snapshots",
        "Session ended:".green().bold(),
        session.stats.tracks_played,
        session.stats.total_duration_seconds,
        session.snapshots.len()
    );
    Ok(ExitCode::SUCCESS)
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::SessionStarted { session_id, .. } => {
            println!("  {} session {}", "*".cyan(), session_id)
        }
        SessionEvent::NewTrack {
            track_id,
            sequence,
            duration_seconds,
            ..
        } => println!(
            "  {} track {} from #{} ({:.1}s)",
            "+".green(),
            &track_id[..8.min(track_id.len())],
            sequence,
            duration_seconds
        ),
        SessionEvent::CrossfadeStarted { duration_ms, .. } => {
            println!("  {} crossfade {}ms", "~".cyan(), duration_ms)
        }
        SessionEvent::SnapshotRequested { .. } => {}
        SessionEvent::SnapshotCreated { receipt, .. } => {
            println!("  {} snapshot {}", "#".yellow(), receipt.location_uri)
        }
        SessionEvent::ConfigurationEvolved { evolution } => println!(
            "  {} evolved: tempo {:+.2}, swing {:+.2}",
            "~".dimmed(),
            evolution.tempo_bias,
            evolution.swing_bias
        ),
        SessionEvent::StreamingError { code, message } => {
            eprintln!("  {} [{}] {}", "!".red(), code, message)
        }
        SessionEvent::SessionEnded { .. } => {}
    }
}
