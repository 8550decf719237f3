//! Zone Sentry - Main Entry Point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sentry::{
    default_event_log, init_logging, install_metrics, run_with_metrics, show_events,
    zone_snippet, SentryConfig,
};
use std::path::PathBuf;
use tracing::info;
use zone::Point;

/// Restricted-zone entry and helmet monitor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML); `sentry.toml` is used when present
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a frame sequence and record zone entries
    Run {
        /// Frame directory (overrides video.source)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Annotated frame directory (overrides video.output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Frame rate of the sequence (overrides video.fps)
        #[arg(long)]
        fps: Option<f64>,

        /// Skip writing annotated frames
        #[arg(long)]
        no_annotate: bool,

        /// Write Prometheus metrics here when the run ends
        #[arg(long)]
        metrics_out: Option<PathBuf>,
    },

    /// Show the recorded events, newest first
    Events {
        /// Event log to read (defaults to the JSONL log, then the export)
        #[arg(short, long)]
        log: Option<PathBuf>,
    },

    /// Print a zone polygon from points given as "x,y"
    Zone {
        #[arg(short, long = "point", required = true)]
        points: Vec<Point>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = SentryConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Run {
            source,
            output,
            fps,
            no_annotate,
            metrics_out,
        } => {
            if let Some(source) = source {
                cfg.video.source = source;
            }
            if let Some(output) = output {
                cfg.video.output = output;
            }
            if no_annotate {
                cfg.video.output = PathBuf::new();
            }
            if fps.is_some() {
                cfg.video.fps = fps;
            }

            init_logging(&cfg.logging.level, cfg.logging.json)?;
            let metrics = install_metrics()?;
            info!("=== Zone Sentry v{} ===", env!("CARGO_PKG_VERSION"));

            let summary = run_with_metrics(&cfg, &metrics, metrics_out.as_deref())?;

            println!(
                "Processed {} frames ({} skipped): {} entries, {} HIGH risk, {} LOW risk",
                summary.frames_processed,
                summary.frames_skipped,
                summary.events.total,
                summary.events.high,
                summary.events.low
            );
        }

        Command::Events { log } => {
            init_logging(&cfg.logging.level, cfg.logging.json)?;
            let path = log.unwrap_or_else(|| default_event_log(&cfg.events).to_path_buf());
            print!("{}", show_events(&path)?);
        }

        Command::Zone { points } => {
            let snippet = zone_snippet(&points).context("Cannot build zone")?;
            print!("{}", snippet);
        }
    }

    Ok(())
}
