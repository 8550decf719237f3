//! Event Log
//!
//! Persistence for zone entry events:
//! - Append-on-trigger JSON Lines store (crash leaves a parseable prefix)
//! - JSON array export of the accumulated log
//! - Per-event snapshot images
//! - Tolerant read-only loading and summaries for viewers

mod event;
mod snapshot;
mod store;
mod summary;

pub use event::{EntryEvent, EventKind, PpeStatus, RiskLevel, TIMESTAMP_FORMAT};
pub use snapshot::SnapshotStore;
pub use store::{load_events, EventStore};
pub use summary::EventSummary;

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Event for frame {got} appended after frame {last}")]
    OutOfOrder { last: u64, got: u64 },
    #[error("Snapshot error: {0}")]
    Snapshot(String),
}
