//! Object Detector Adapters
//!
//! The monitor consumes detectors only through the [`Detector`] capability:
//! given a frame and a confidence floor, return fixed-shape [`Detection`]s.
//! Model-specific output is validated here, at the adapter boundary:
//! labels outside the [`ObjectClass`] allow-list never reach the core.
//!
//! Adapters:
//! - [`OnnxDetector`]: YOLOv8 ONNX export via ONNX Runtime
//! - [`ReplayDetector`]: detections recorded to JSON Lines, keyed by frame index

pub mod onnx;
pub mod replay;
pub mod types;

pub use onnx::{OnnxDetector, YoloConfig};
pub use replay::{ReplayDetector, ReplayRecord};
pub use types::{Detection, ObjectClass, RawDetection};

use frame_source::VideoFrame;
use thiserror::Error;

/// Detector error types
#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Unexpected model output: {0}")]
    InvalidOutput(String),

    #[error("Replay data error: {0}")]
    Replay(String),
}

/// Detection capability consumed by the zone monitor
pub trait Detector {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Detect allow-listed objects whose confidence exceeds `min_confidence`
    fn detect(
        &mut self,
        frame: &VideoFrame,
        min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectorError>;
}
