//! Entry event record

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// ISO-8601 with second precision, no zone (wall-clock local time)
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Risk classification of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    /// Helmet visible on an intruding person
    Low,
    /// No helmet found
    High,
}

impl RiskLevel {
    pub fn from_helmet(helmet_present: bool) -> Self {
        if helmet_present {
            RiskLevel::Low
        } else {
            RiskLevel::High
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event type tag; entries are the only kind recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "entry_detected")]
    EntryDetected,
}

/// PPE findings for the intruding person(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PpeStatus {
    pub helmet: bool,
}

/// Immutable record of one zone entry.
///
/// Records read back must carry the risk level implied by `ppe.helmet`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredEvent")]
pub struct EntryEvent {
    timestamp: String,
    event: EventKind,
    frame_index: u64,
    snapshot_path: Option<String>,
    ppe: PpeStatus,
    risk_level: RiskLevel,
}

/// Wire shape of [`EntryEvent`] before the risk check
#[derive(Deserialize)]
struct StoredEvent {
    timestamp: String,
    event: EventKind,
    frame_index: u64,
    snapshot_path: Option<String>,
    ppe: PpeStatus,
    risk_level: RiskLevel,
}

impl TryFrom<StoredEvent> for EntryEvent {
    type Error = String;

    fn try_from(raw: StoredEvent) -> Result<Self, Self::Error> {
        let expected = RiskLevel::from_helmet(raw.ppe.helmet);
        if raw.risk_level != expected {
            return Err(format!(
                "frame {}: risk_level {} contradicts ppe.helmet = {} (expected {})",
                raw.frame_index, raw.risk_level, raw.ppe.helmet, expected
            ));
        }
        Ok(Self {
            timestamp: raw.timestamp,
            event: raw.event,
            frame_index: raw.frame_index,
            snapshot_path: raw.snapshot_path,
            ppe: raw.ppe,
            risk_level: raw.risk_level,
        })
    }
}

impl EntryEvent {
    /// Build an event; the risk level is derived from `helmet_present`.
    /// `snapshot` is `None` when the snapshot could not be written.
    pub fn new(
        triggered_at: NaiveDateTime,
        frame_index: u64,
        snapshot: Option<&Path>,
        helmet_present: bool,
    ) -> Self {
        Self {
            timestamp: triggered_at.format(TIMESTAMP_FORMAT).to_string(),
            event: EventKind::EntryDetected,
            frame_index,
            snapshot_path: snapshot.map(|p| p.to_string_lossy().into_owned()),
            ppe: PpeStatus {
                helmet: helmet_present,
            },
            risk_level: RiskLevel::from_helmet(helmet_present),
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn kind(&self) -> EventKind {
        self.event
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn snapshot_path(&self) -> Option<&str> {
        self.snapshot_path.as_deref()
    }

    pub fn helmet_present(&self) -> bool {
        self.ppe.helmet
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }
}
