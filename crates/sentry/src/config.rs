//! Layered runtime configuration
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - TOML file (`--config`, `sentry.toml` when present)
//! - `SENTRY__SECTION__KEY` environment variables
//! - Command-line overrides applied by the caller

use intrusion::{MonitorConfig, PpeConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use zone::{Point, ZonePolygon};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "sentry.toml";

/// COCO-80 class table of the stock YOLOv8 person model
pub const COCO_LABELS: &[&str] = &[
    "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck", "boat",
    "traffic light", "fire hydrant", "stop sign", "parking meter", "bench", "bird", "cat", "dog",
    "horse", "sheep", "cow", "elephant", "bear", "zebra", "giraffe", "backpack", "umbrella",
    "handbag", "tie", "suitcase", "frisbee", "skis", "snowboard", "sports ball", "kite",
    "baseball bat", "baseball glove", "skateboard", "surfboard", "tennis racket", "bottle",
    "wine glass", "cup", "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
    "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch", "potted plant",
    "bed", "dining table", "toilet", "tv", "laptop", "mouse", "remote", "keyboard", "cell phone",
    "microwave", "oven", "toaster", "sink", "refrigerator", "book", "clock", "vase", "scissors",
    "teddy bear", "hair drier", "toothbrush",
];

/// Class table of the construction-site PPE helmet model
pub const PPE_LABELS: &[&str] = &[
    "Hardhat",
    "Mask",
    "NO-Hardhat",
    "NO-Mask",
    "NO-Safety Vest",
    "Person",
    "Safety Cone",
    "Safety Vest",
    "machinery",
    "vehicle",
];

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(e: config::ConfigError) -> Self {
        ConfigError::Load(e.to_string())
    }
}

/// Full runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentryConfig {
    pub video: VideoConfig,
    pub zone: ZoneConfig,
    pub detection: DetectionConfig,
    pub ppe: PpeSection,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

/// Input and annotated output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Directory of frames, read in file-name order
    pub source: PathBuf,
    /// Annotated frame directory; empty disables annotated output
    pub output: PathBuf,
    /// Frame rate of the sequence (falls back to 25 when unset)
    pub fps: Option<f64>,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("data/frames"),
            output: PathBuf::from("outputs/annotated"),
            fps: None,
        }
    }
}

/// Restricted zone, in frame pixel coordinates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneConfig {
    pub polygon: Vec<Point>,
}

/// Detector backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Onnx,
    Replay,
}

/// Person and helmet detectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub backend: Backend,
    pub person_model: PathBuf,
    pub helmet_model: PathBuf,
    pub person_labels: Vec<String>,
    pub helmet_labels: Vec<String>,
    /// Person confidence floor (exclusive)
    pub person_confidence: f32,
    /// Helmet confidence floor (exclusive)
    pub helmet_confidence: f32,
    pub input_size: u32,
    pub nms_iou: f32,
    /// Recorded person detections (JSON Lines), replay backend only
    pub person_replay: Option<PathBuf>,
    /// Recorded helmet detections (JSON Lines), replay backend only
    pub helmet_replay: Option<PathBuf>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Onnx,
            person_model: PathBuf::from("models/yolov8n.onnx"),
            helmet_model: PathBuf::from("models/helmet_best.onnx"),
            person_labels: COCO_LABELS.iter().map(|s| s.to_string()).collect(),
            helmet_labels: PPE_LABELS.iter().map(|s| s.to_string()).collect(),
            person_confidence: 0.35,
            helmet_confidence: 0.30,
            input_size: 640,
            nms_iou: 0.45,
            person_replay: None,
            helmet_replay: None,
        }
    }
}

/// Helmet association geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PpeSection {
    /// Top share of the person box searched for a helmet
    pub head_fraction: f64,
    /// Head/helmet IOU that must be exceeded
    pub iou_threshold: f64,
}

impl Default for PpeSection {
    fn default() -> Self {
        let ppe = PpeConfig::default();
        Self {
            head_fraction: ppe.head_fraction,
            iou_threshold: ppe.iou_threshold,
        }
    }
}

/// Event log, export and snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    pub cooldown_seconds: f64,
    /// Append-on-trigger JSON Lines log
    pub log_path: PathBuf,
    /// JSON array written at the end of the run
    pub export_path: PathBuf,
    pub snapshot_dir: PathBuf,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 2.0,
            log_path: PathBuf::from("outputs/events_log.jsonl"),
            export_path: PathBuf::from("outputs/events_log.json"),
            snapshot_dir: PathBuf::from("outputs/event_snapshots"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// JSON log lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl SentryConfig {
    /// Load defaults, then `path` (or `sentry.toml` if it exists), then the
    /// `SENTRY__` environment. An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&SentryConfig::default())?);

        builder = match path {
            Some(p) => builder.add_source(config::File::from(p).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix("SENTRY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Check ranges and build the zone polygon
    pub fn validate(&self) -> Result<ZonePolygon, ConfigError> {
        let zone = ZonePolygon::new(self.zone.polygon.clone())
            .map_err(|e| ConfigError::Invalid(format!("zone.polygon: {}", e)))?;

        let d = &self.detection;
        unit_range("detection.person_confidence", d.person_confidence as f64)?;
        unit_range("detection.helmet_confidence", d.helmet_confidence as f64)?;
        unit_range("detection.nms_iou", d.nms_iou as f64)?;
        unit_range("ppe.iou_threshold", self.ppe.iou_threshold)?;

        if !(self.ppe.head_fraction > 0.0 && self.ppe.head_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "ppe.head_fraction must be in (0, 1], got {}",
                self.ppe.head_fraction
            )));
        }
        if !(self.events.cooldown_seconds >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "events.cooldown_seconds must be >= 0, got {}",
                self.events.cooldown_seconds
            )));
        }
        if d.input_size == 0 {
            return Err(ConfigError::Invalid("detection.input_size must be > 0".into()));
        }
        if d.backend == Backend::Replay && (d.person_replay.is_none() || d.helmet_replay.is_none())
        {
            return Err(ConfigError::Invalid(
                "replay backend needs detection.person_replay and detection.helmet_replay".into(),
            ));
        }

        Ok(zone)
    }

    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            person_confidence: self.detection.person_confidence,
            cooldown_seconds: self.events.cooldown_seconds,
            ppe: PpeConfig {
                head_fraction: self.ppe.head_fraction,
                iou_threshold: self.ppe.iou_threshold,
                helmet_confidence: self.detection.helmet_confidence,
            },
        }
    }

    /// Annotated output directory, if enabled
    pub fn annotated_output(&self) -> Option<&Path> {
        let out = self.video.output.as_path();
        (!out.as_os_str().is_empty()).then_some(out)
    }
}

fn unit_range(key: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{} must be in [0, 1], got {}",
            key, value
        )))
    }
}
