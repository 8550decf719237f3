//! Event recording: snapshot, record, append

use chrono::{Local, NaiveDateTime};
use event_log::{EntryEvent, EventStore, SnapshotStore, StorageError, TIMESTAMP_FORMAT};
use frame_source::VideoFrame;
use tracing::{info, warn};

/// Wall-clock source for event timestamps
pub type Clock = fn() -> NaiveDateTime;

/// Local wall-clock time
pub fn local_clock() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Owns the run's event log and snapshot directory
pub struct EventRecorder {
    store: EventStore,
    snapshots: Option<SnapshotStore>,
    clock: Clock,
}

impl EventRecorder {
    pub fn new(store: EventStore, snapshots: Option<SnapshotStore>) -> Self {
        Self {
            store,
            snapshots,
            clock: local_clock,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Record an entry on `frame`.
    ///
    /// A snapshot that cannot be written leaves the event without a snapshot
    /// reference. A failed log-file append is logged; the event stays in the
    /// in-memory log and is still returned.
    pub fn record(
        &mut self,
        frame: &VideoFrame,
        frame_index: u64,
        helmet_present: bool,
    ) -> Result<EntryEvent, StorageError> {
        let triggered_at = (self.clock)();
        let timestamp = triggered_at.format(TIMESTAMP_FORMAT).to_string();

        let snapshot = match &self.snapshots {
            Some(store) => match store.save(frame, frame_index, &timestamp) {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!("Snapshot for frame {} not saved: {}", frame_index, e);
                    metrics::counter!("sentry_snapshot_failures_total").increment(1);
                    None
                }
            },
            None => None,
        };

        let event = EntryEvent::new(triggered_at, frame_index, snapshot.as_deref(), helmet_present);
        match self.store.append(event.clone()) {
            Ok(()) => {}
            Err(StorageError::Io(e)) => {
                warn!("Event for frame {} kept in memory only: {}", frame_index, e);
            }
            Err(e) => return Err(e),
        }

        info!(
            "EVENT: {} RISK ENTRY at frame {} (helmet: {}, snapshot: {})",
            event.risk_level(),
            frame_index,
            helmet_present,
            event.snapshot_path().unwrap_or("none")
        );
        Ok(event)
    }

    pub fn events(&self) -> &[EntryEvent] {
        self.store.events()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn into_store(self) -> EventStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use event_log::{load_events, RiskLevel};
    use std::fs;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 15)
            .unwrap()
    }

    #[test]
    fn test_record_writes_snapshot_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("events.jsonl");
        let store = EventStore::open(&log).unwrap();
        let snaps = SnapshotStore::create(dir.path().join("snaps")).unwrap();
        let mut recorder = EventRecorder::new(store, Some(snaps)).with_clock(fixed_clock);

        let frame = VideoFrame::filled(8, 8, [0, 0, 0], 12);
        let event = recorder.record(&frame, 12, false).unwrap();

        assert_eq!(event.timestamp(), "2024-06-01T09:30:15");
        assert_eq!(event.risk_level(), RiskLevel::High);
        let snap = event.snapshot_path().unwrap();
        assert!(snap.ends_with("entry_12_2024-06-01T09-30-15.jpg"));
        assert!(event.has_snapshot());
        assert_eq!(load_events(&log).unwrap(), vec![event]);
    }

    #[test]
    fn test_snapshot_failure_still_records() {
        let dir = tempfile::tempdir().unwrap();
        let snaps_dir = dir.path().join("snaps");
        let snaps = SnapshotStore::create(&snaps_dir).unwrap();
        fs::remove_dir_all(&snaps_dir).unwrap();

        let mut recorder =
            EventRecorder::new(EventStore::in_memory(), Some(snaps)).with_clock(fixed_clock);
        let event = recorder
            .record(&VideoFrame::filled(4, 4, [0; 3], 3), 3, true)
            .unwrap();

        assert_eq!(event.snapshot_path(), None);
        assert_eq!(event.risk_level(), RiskLevel::Low);
        assert_eq!(recorder.events().len(), 1);
    }

    #[test]
    fn test_out_of_order_is_an_error() {
        let mut recorder = EventRecorder::new(EventStore::in_memory(), None).with_clock(fixed_clock);
        let frame = VideoFrame::filled(2, 2, [0; 3], 0);
        recorder.record(&frame, 5, true).unwrap();
        assert!(matches!(
            recorder.record(&frame, 4, true),
            Err(StorageError::OutOfOrder { .. })
        ));
    }
}
