//! Tracing subscriber setup

use anyhow::{anyhow, Context, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global subscriber at `level`, as text or JSON lines
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let level: Level = level
        .parse()
        .map_err(|_| anyhow!("Unknown log level '{}'", level))?;

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
    .context("Failed to set tracing subscriber")
}
