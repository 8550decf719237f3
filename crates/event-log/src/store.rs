//! Append-only event store

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::{EntryEvent, StorageError};

/// Event log for a single run.
///
/// Every event is written to a JSON Lines file as soon as it is appended,
/// so a crash loses nothing already recorded. The same events are kept in
/// memory in trigger order for the final JSON array export.
pub struct EventStore {
    path: Option<PathBuf>,
    writer: Option<BufWriter<File>>,
    events: Vec<EntryEvent>,
}

impl EventStore {
    /// Start a fresh log at `path`, creating parent directories and
    /// truncating anything left from a previous run.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| io_error(&path, e))?;

        info!("Event log opened at {}", path.display());
        Ok(Self {
            path: Some(path),
            writer: Some(BufWriter::new(file)),
            events: Vec::new(),
        })
    }

    /// Store that keeps events in memory only
    pub fn in_memory() -> Self {
        Self {
            path: None,
            writer: None,
            events: Vec::new(),
        }
    }

    /// Append an event. Frame indices must strictly increase.
    ///
    /// If the file write fails the event is still kept in memory and the
    /// error is returned.
    pub fn append(&mut self, event: EntryEvent) -> Result<(), StorageError> {
        if let Some(last) = self.events.last() {
            if event.frame_index() <= last.frame_index() {
                return Err(StorageError::OutOfOrder {
                    last: last.frame_index(),
                    got: event.frame_index(),
                });
            }
        }

        let line = serde_json::to_string(&event)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.events.push(event);

        if let (Some(writer), Some(path)) = (self.writer.as_mut(), self.path.as_ref()) {
            writeln!(writer, "{}", line).map_err(|e| io_error(path, e))?;
            writer.flush().map_err(|e| io_error(path, e))?;
            writer.get_ref().sync_data().map_err(|e| io_error(path, e))?;
            debug!("Appended event to {}", path.display());
        }
        Ok(())
    }

    /// Events in trigger order
    pub fn events(&self) -> &[EntryEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the whole log as a pretty JSON array (temp file, then rename)
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let json = serde_json::to_string_pretty(&self.events)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
        fs::rename(&tmp, path).map_err(|e| io_error(path, e))?;

        info!("Exported {} events to {}", self.events.len(), path.display());
        Ok(())
    }
}

/// Read an event log for viewing.
///
/// Accepts either a JSON array export or a JSON Lines log. A missing or
/// empty file is an empty log. In JSON Lines, an unparseable final line
/// (a write cut short by a crash) is skipped with a warning.
pub fn load_events(path: impl AsRef<Path>) -> Result<Vec<EntryEvent>, StorageError> {
    let path = path.as_ref();
    if !path.exists() {
        debug!("No event log at {}", path.display());
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let trimmed = content.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed)
            .map_err(|e| StorageError::Serialization(format!("{}: {}", path.display(), e)));
    }

    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .collect();

    let mut events = Vec::with_capacity(lines.len());
    for (pos, (line_no, line)) in lines.iter().enumerate() {
        match serde_json::from_str::<EntryEvent>(line) {
            Ok(event) => events.push(event),
            Err(e) if pos + 1 == lines.len() => {
                warn!(
                    "Ignoring truncated final record in {} (line {}): {}",
                    path.display(),
                    line_no + 1,
                    e
                );
            }
            Err(e) => {
                return Err(StorageError::Serialization(format!(
                    "{}:{}: {}",
                    path.display(),
                    line_no + 1,
                    e
                )))
            }
        }
    }
    Ok(events)
}

fn io_error(path: &Path, e: std::io::Error) -> StorageError {
    StorageError::Io(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(frame_index: u64, helmet: bool) -> EntryEvent {
        let at = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, frame_index as u32 % 60)
            .unwrap();
        EntryEvent::new(at, frame_index, None, helmet)
    }

    #[test]
    fn test_append_persists_each_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("events.jsonl");
        let mut store = EventStore::open(&path).unwrap();

        store.append(event(0, true)).unwrap();
        assert_eq!(load_events(&path).unwrap().len(), 1);

        store.append(event(60, false)).unwrap();
        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[1].frame_index(), 60);
    }

    #[test]
    fn test_open_resets_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        EventStore::open(&path).unwrap().append(event(5, true)).unwrap();

        let store = EventStore::open(&path).unwrap();
        assert!(store.is_empty());
        assert!(load_events(&path).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_out_of_order() {
        let mut store = EventStore::in_memory();
        store.append(event(10, true)).unwrap();
        let err = store.append(event(10, false)).unwrap_err();
        assert!(matches!(err, StorageError::OutOfOrder { last: 10, got: 10 }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_export_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = EventStore::in_memory();
        store.append(event(0, true)).unwrap();
        store.append(event(60, false)).unwrap();

        let out = dir.path().join("events_log.json");
        store.export_json(&out).unwrap();

        let raw = fs::read_to_string(&out).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[1]["risk_level"], "HIGH");
        assert_eq!(load_events(&out).unwrap(), store.events());
    }

    #[test]
    fn test_export_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("events_log.json");
        EventStore::in_memory().export_json(&out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap().trim(), "[]");
        assert!(load_events(&out).unwrap().is_empty());
    }

    #[test]
    fn test_load_missing_and_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_events(dir.path().join("absent.json")).unwrap().is_empty());

        let empty = dir.path().join("empty.jsonl");
        fs::write(&empty, "\n").unwrap();
        assert!(load_events(&empty).unwrap().is_empty());
    }

    #[test]
    fn test_load_tolerates_truncated_tail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let good = serde_json::to_string(&event(0, true)).unwrap();
        fs::write(&path, format!("{}\n{{\"timestamp\": \"2024-", good)).unwrap();

        let loaded = load_events(&path).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn test_load_rejects_corrupt_middle_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        let good = serde_json::to_string(&event(0, true)).unwrap();
        fs::write(&path, format!("garbage\n{}\n", good)).unwrap();

        assert!(matches!(
            load_events(&path),
            Err(StorageError::Serialization(_))
        ));
    }

    #[test]
    fn test_load_rejects_risk_helmet_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events_log.json");
        let tampered = serde_json::to_string(&event(0, true))
            .unwrap()
            .replace("\"LOW\"", "\"HIGH\"");
        fs::write(&path, format!("[{}]", tampered)).unwrap();

        assert!(matches!(
            load_events(&path),
            Err(StorageError::Serialization(_))
        ));
    }
}
