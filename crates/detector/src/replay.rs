//! Replay of recorded detector output

use frame_source::VideoFrame;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

use crate::{Detection, Detector, DetectorError, RawDetection};

/// One line of a replay file: everything a detector reported for a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayRecord {
    pub frame_index: u64,
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

/// Serves detections recorded to JSON Lines instead of running a model.
///
/// Frames without a record yield no detections.
pub struct ReplayDetector {
    name: String,
    frames: HashMap<u64, Vec<Detection>>,
}

impl ReplayDetector {
    pub fn from_records(name: &str, records: impl IntoIterator<Item = ReplayRecord>) -> Self {
        let mut frames: HashMap<u64, Vec<Detection>> = HashMap::new();
        let mut dropped = 0usize;

        for record in records {
            let entry = frames.entry(record.frame_index).or_default();
            for raw in &record.detections {
                match raw.validate() {
                    Some(det) => entry.push(det),
                    None => dropped += 1,
                }
            }
        }

        if dropped > 0 {
            warn!(
                "{} replay: dropped {} detections outside the label allow-list",
                name, dropped
            );
        }

        Self {
            name: name.to_string(),
            frames,
        }
    }

    /// Load a JSON Lines recording. Blank lines are ignored.
    pub fn load(name: &str, path: impl AsRef<Path>) -> Result<Self, DetectorError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| DetectorError::Replay(format!("{}: {}", path.display(), e)))?;

        let mut records = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line =
                line.map_err(|e| DetectorError::Replay(format!("{}: {}", path.display(), e)))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: ReplayRecord = serde_json::from_str(&line).map_err(|e| {
                DetectorError::Replay(format!("{}:{}: {}", path.display(), line_no + 1, e))
            })?;
            records.push(record);
        }

        info!(
            "Loaded {} replay from {} ({} frames)",
            name,
            path.display(),
            records.len()
        );
        Ok(Self::from_records(name, records))
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl Detector for ReplayDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(
        &mut self,
        frame: &VideoFrame,
        min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        Ok(self
            .frames
            .get(&frame.sequence)
            .map(|dets| {
                dets.iter()
                    .filter(|d| d.confidence > min_confidence)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }
}
