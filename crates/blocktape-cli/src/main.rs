//! Blocktape CLI - Command-line interface for lo-fi track generation
//!
//! This binary derives parameters, renders tracks, inspects WAV files, and
//! runs streaming sessions from recorded event batches.

mod cli_args;

use clap::Parser;
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

use blocktape_cli::commands;
use blocktape_cli::commands::generate::GenerateOptions;
use blocktape_cli::commands::stream::StreamOptions;
use blocktape_cli::logging;
use cli_args::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(LevelFilter::WARN);

    let result = match cli.command {
        Commands::Derive {
            events,
            time_bucket,
            seed,
            output,
        } => commands::derive::run(&events, time_bucket, seed, output.as_deref()),
        Commands::Generate {
            events,
            out_dir,
            time_bucket,
            seed,
            preview,
            animation_base_url,
            json,
        } => commands::generate::run(
            &events,
            &GenerateOptions {
                out_dir,
                time_bucket,
                seed,
                preview,
                animation_base_url,
            },
            json,
        ),
        Commands::Inspect { input, json } => commands::inspect::run(&input, json),
        Commands::Stream {
            events,
            config,
            archive_dir,
            ticks,
            tick_ms,
            preview,
            snapshot_threshold,
        } => commands::stream::run(
            &events,
            &StreamOptions {
                config,
                archive_dir,
                ticks,
                tick_ms,
                preview,
                snapshot_threshold,
            },
        ),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_generate() {
        let cli = Cli::try_parse_from([
            "blocktape",
            "generate",
            "--events",
            "batch.json",
            "--time-bucket",
            "42",
            "--preview",
            "5",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                events,
                out_dir,
                time_bucket,
                preview,
                json,
                ..
            } => {
                assert_eq!(events, "batch.json");
                assert!(out_dir.is_none());
                assert_eq!(time_bucket, Some(42));
                assert_eq!(preview, Some(5.0));
                assert!(json);
            }
            _ => panic!("expected generate command"),
        }
    }

    #[test]
    fn test_cli_parses_stream() {
        let cli = Cli::try_parse_from([
            "blocktape",
            "stream",
            "-e",
            "replay.json",
            "--ticks",
            "3",
            "--archive-dir",
            "out",
        ])
        .unwrap();
        match cli.command {
            Commands::Stream {
                events,
                ticks,
                archive_dir,
                config,
                ..
            } => {
                assert_eq!(events, "replay.json");
                assert_eq!(ticks, Some(3));
                assert_eq!(archive_dir.as_deref(), Some("out"));
                assert!(config.is_none());
            }
            _ => panic!("expected stream command"),
        }
    }

    #[test]
    fn test_cli_parses_inspect() {
        let cli = Cli::try_parse_from(["blocktape", "inspect", "-i", "track.wav"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Inspect { ref input, json: false } if input == "track.wav"
        ));
    }

    #[test]
    fn test_cli_requires_events() {
        assert!(Cli::try_parse_from(["blocktape", "derive"]).is_err());
    }
}
