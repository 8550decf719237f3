//! Snapshot images captured at trigger time

use frame_source::VideoFrame;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::StorageError;

/// Directory of per-event JPEG snapshots
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::Io(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `entry_{frame}_{timestamp}.jpg`, with ':' replaced so the name is
    /// valid on every filesystem
    pub fn file_name(frame_index: u64, timestamp: &str) -> String {
        format!("entry_{}_{}.jpg", frame_index, timestamp.replace(':', "-"))
    }

    /// Encode `frame` as JPEG and return the written path
    pub fn save(
        &self,
        frame: &VideoFrame,
        frame_index: u64,
        timestamp: &str,
    ) -> Result<PathBuf, StorageError> {
        let path = self.dir.join(Self::file_name(frame_index, timestamp));
        let img = frame
            .to_rgb_image()
            .map_err(|e| StorageError::Snapshot(e.to_string()))?;
        img.save(&path)
            .map_err(|e| StorageError::Snapshot(format!("{}: {}", path.display(), e)))?;

        debug!("Snapshot written to {}", path.display());
        Ok(path)
    }
}
