//! `sentry events`: read-only view of a recorded event log

use anyhow::{Context, Result};
use event_log::{load_events, EntryEvent, EventSummary};
use std::fmt::Write;
use std::path::Path;

use crate::config::EventsConfig;

/// Message shown for a log with no events
pub const NO_EVENTS: &str = "No entry events recorded.";

/// Log read when none is named: the append-only JSONL log, which is current
/// during a run and after a crash. The JSON export is used only when no JSONL
/// log exists.
pub fn default_event_log(events: &EventsConfig) -> &Path {
    if events.log_path.exists() || !events.export_path.exists() {
        &events.log_path
    } else {
        &events.export_path
    }
}

/// Load `path` (JSON array or JSON Lines) and render it. A missing log
/// renders as empty.
pub fn show_events(path: &Path) -> Result<String> {
    let events =
        load_events(path).with_context(|| format!("Cannot read event log {}", path.display()))?;
    Ok(render_events(&events))
}

/// Summary line followed by one line per event, newest first
pub fn render_events(events: &[EntryEvent]) -> String {
    if events.is_empty() {
        return format!("{}\n", NO_EVENTS);
    }

    let summary = EventSummary::from_events(events);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Entries: {}  HIGH risk: {}  LOW risk: {}  Missing snapshots: {}",
        summary.total, summary.high, summary.low, summary.missing_snapshots
    );
    for event in events.iter().rev() {
        let snapshot = match event.snapshot_path() {
            Some(path) if event.has_snapshot() => path.to_string(),
            Some(path) => format!("{} (missing)", path),
            None => "(no snapshot)".to_string(),
        };
        let _ = writeln!(
            out,
            "{}  frame {:>6}  {:<4}  helmet: {:<3}  {}",
            event.timestamp(),
            event.frame_index(),
            event.risk_level().as_str(),
            if event.helmet_present() { "yes" } else { "no" },
            snapshot
        );
    }
    out
}
