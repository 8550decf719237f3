//! Aggregate view of an event log

use serde::Serialize;
use std::path::Path;

use crate::{EntryEvent, RiskLevel};

/// Counts shown by the viewer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EventSummary {
    pub total: usize,
    pub high: usize,
    pub low: usize,
    /// Events whose snapshot was never written or no longer exists
    pub missing_snapshots: usize,
}

impl EventSummary {
    pub fn from_events(events: &[EntryEvent]) -> Self {
        events.iter().fold(Self::default(), |mut acc, e| {
            acc.total += 1;
            match e.risk_level() {
                RiskLevel::High => acc.high += 1,
                RiskLevel::Low => acc.low += 1,
            }
            if !snapshot_exists(e) {
                acc.missing_snapshots += 1;
            }
            acc
        })
    }
}

/// Whether the event's snapshot file is present on disk
pub(crate) fn snapshot_exists(event: &EntryEvent) -> bool {
    event
        .snapshot_path()
        .map(|p| Path::new(p).is_file())
        .unwrap_or(false)
}

impl EntryEvent {
    /// Whether the snapshot referenced by this event can be read
    pub fn has_snapshot(&self) -> bool {
        snapshot_exists(self)
    }
}
