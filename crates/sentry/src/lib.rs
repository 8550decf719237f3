//! Zone Sentry
//!
//! Command-line front end for the zone intrusion monitor:
//! - Layered configuration (defaults, TOML file, environment, flags)
//! - Logging and metrics setup
//! - `run`: process a frame sequence into events, snapshots and annotated frames
//! - `events`: summarize a recorded event log
//! - `zone`: turn clicked points into a zone polygon snippet

pub mod config;
pub mod logging;
pub mod metrics;
pub mod run;
pub mod viewer;

pub use config::{ConfigError, SentryConfig};
pub use logging::init_logging;
pub use metrics::{install_metrics, write_metrics};
pub use run::{build_detectors, run_pipeline, run_with_metrics, Pipeline};
pub use viewer::{default_event_log, render_events, show_events};

use zone::{Point, ZoneBuilder};

/// Build a zone from `points` in click order and render it as a
/// `[zone]` TOML section.
pub fn zone_snippet(points: &[Point]) -> Result<String, zone::ZoneError> {
    let mut builder = ZoneBuilder::new();
    for point in points {
        builder.push(*point);
    }
    let polygon = builder.build()?;

    let vertices: Vec<String> = polygon
        .vertices()
        .iter()
        .map(|p| format!("[{}, {}]", p.x, p.y))
        .collect();
    Ok(format!("[zone]\npolygon = [{}]\n", vertices.join(", ")))
}
