//! Zone Intrusion Detection
//!
//! Turns per-frame person and helmet detections into deduplicated entry events:
//! - Zone membership of each person (box center in polygon)
//! - Two-state entry gate with a frame-count cooldown
//! - Helmet association on the intruding person's head region
//! - Event recording with snapshot evidence and a LOW/HIGH risk label

pub mod gate;
pub mod membership;
pub mod monitor;
pub mod ppe;
pub mod recorder;

pub use gate::{cooldown_frames, CooldownState, EntryGate, GateDecision, ZoneState};
pub use membership::{any_inside, evaluate_membership, PersonObservation};
pub use monitor::{FrameOutcome, MonitorConfig, RunSummary, ZoneMonitor};
pub use ppe::{helmet_boxes, PpeAssociator, PpeConfig, PpeMatch};
pub use recorder::{local_clock, Clock, EventRecorder};

use detector::DetectorError;
use event_log::StorageError;
use frame_source::SourceError;
use thiserror::Error;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Detector '{name}' failed: {source}")]
    Detector {
        name: String,
        #[source]
        source: DetectorError,
    },

    #[error("Frame source failed: {0}")]
    Source(#[from] SourceError),

    #[error("Event storage failed: {0}")]
    Storage(#[from] StorageError),
}
