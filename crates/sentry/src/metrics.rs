//! Prometheus exposition of the pipeline counters

use anyhow::{Context, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fs;
use std::path::Path;
use tracing::info;

/// Install the global metrics recorder
pub fn install_metrics() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install metrics recorder")
}

/// Write the current exposition text to `path`
pub fn write_metrics(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create {}", parent.display()))?;
    }
    fs::write(path, handle.render())
        .with_context(|| format!("Cannot write metrics to {}", path.display()))?;
    info!("Metrics written to {}", path.display());
    Ok(())
}
