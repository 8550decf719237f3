//! YOLOv8 ONNX detector

use frame_source::VideoFrame;
use image::imageops::FilterType;
use ndarray::{Array4, ArrayViewD};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, error, info};
use zone::{iou, BoundingBox};

use crate::{Detection, Detector, DetectorError, ObjectClass};

/// Channels before the class scores in each YOLOv8 prediction: cx, cy, w, h
const CXYWH_OFFSET: usize = 4;
/// Letterbox padding value
const PAD_VALUE: f32 = 144.0 / 255.0;

/// YOLOv8 model configuration
#[derive(Debug, Clone)]
pub struct YoloConfig {
    /// Path to the exported `.onnx` file
    pub model_path: PathBuf,
    /// Class-id → label table of the model
    pub labels: Vec<String>,
    /// Square network input size
    pub input_size: u32,
    /// IOU above which overlapping same-class boxes are suppressed
    pub nms_iou: f32,
}

/// Detector backed by an ONNX Runtime session
pub struct OnnxDetector {
    name: String,
    session: Session,
    output_name: String,
    labels: Vec<String>,
    input_size: u32,
    nms_iou: f32,
}

impl OnnxDetector {
    pub fn load(name: &str, config: YoloConfig) -> Result<Self, DetectorError> {
        let path = &config.model_path;
        if !path.is_file() {
            return Err(DetectorError::ModelLoad(format!(
                "{} model not found at {}",
                name,
                path.display()
            )));
        }
        if config.input_size == 0 {
            return Err(DetectorError::ModelLoad("input size must be positive".into()));
        }

        info!("Loading {} model from {}", name, path.display());
        let session = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
            .and_then(|b| b.commit_from_file(path))
            .map_err(|e| {
                error!("Failed to load {} model: {}", name, e);
                DetectorError::ModelLoad(e.to_string())
            })?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| DetectorError::ModelLoad(format!("{} model has no outputs", name)))?;

        info!(
            "{} model ready: {} classes, input {}x{}",
            name,
            config.labels.len(),
            config.input_size,
            config.input_size
        );

        Ok(Self {
            name: name.to_string(),
            session,
            output_name,
            labels: config.labels,
            input_size: config.input_size,
            nms_iou: config.nms_iou,
        })
    }

    /// Aspect-preserving resize into the top-left of a padded square tensor.
    /// Returns the tensor and the scale factor applied.
    fn preprocess(&self, frame: &VideoFrame) -> Result<(Array4<f32>, f32), DetectorError> {
        let img = frame
            .to_rgb_image()
            .map_err(|e| DetectorError::ImageProcessing(e.to_string()))?;
        if frame.width == 0 || frame.height == 0 {
            return Err(DetectorError::ImageProcessing("empty frame".into()));
        }

        let size = self.input_size as f32;
        let ratio = (size / frame.width as f32).min(size / frame.height as f32);
        let w_new = ((frame.width as f32 * ratio).round() as u32).clamp(1, self.input_size);
        let h_new = ((frame.height as f32 * ratio).round() as u32).clamp(1, self.input_size);
        let resized = image::imageops::resize(&img, w_new, h_new, FilterType::Triangle);

        let s = self.input_size as usize;
        let mut input = Array4::<f32>::from_elem((1, 3, s, s), PAD_VALUE);
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            input[[0, 0, y, x]] = pixel[0] as f32 / 255.0;
            input[[0, 1, y, x]] = pixel[1] as f32 / 255.0;
            input[[0, 2, y, x]] = pixel[2] as f32 / 255.0;
        }

        Ok((input, ratio))
    }
}

impl Detector for OnnxDetector {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(
        &mut self,
        frame: &VideoFrame,
        min_confidence: f32,
    ) -> Result<Vec<Detection>, DetectorError> {
        let (input, ratio) = self.preprocess(frame)?;

        let tensor =
            Tensor::from_array(input).map_err(|e| DetectorError::Inference(e.to_string()))?;
        let outputs = self
            .session
            .run(ort::inputs![tensor].map_err(|e| DetectorError::Inference(e.to_string()))?)
            .map_err(|e| DetectorError::Inference(e.to_string()))?;

        let output = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InvalidOutput(e.to_string()))?;

        let decoded = decode_predictions(
            &output,
            &self.labels,
            ratio,
            (frame.width, frame.height),
            min_confidence,
        )?;
        let detections = non_max_suppression(decoded, self.nms_iou);

        debug!(
            "{} detector: {} detections on frame {}",
            self.name,
            detections.len(),
            frame.sequence
        );
        Ok(detections)
    }
}

/// Decode a `[1, 4 + nc, anchors]` YOLOv8 output into allow-listed detections
/// in frame pixels. No suppression is applied here.
pub(crate) fn decode_predictions(
    output: &ArrayViewD<'_, f32>,
    labels: &[String],
    ratio: f32,
    (frame_w, frame_h): (u32, u32),
    min_confidence: f32,
) -> Result<Vec<Detection>, DetectorError> {
    let shape = output.shape();
    if shape.len() != 3 || shape[0] != 1 || shape[1] <= CXYWH_OFFSET {
        return Err(DetectorError::InvalidOutput(format!(
            "expected [1, 4+nc, anchors], got {:?}",
            shape
        )));
    }
    if ratio <= 0.0 {
        return Err(DetectorError::InvalidOutput("non-positive scale ratio".into()));
    }

    let nc = shape[1] - CXYWH_OFFSET;
    let anchors = shape[2];
    let (fw, fh) = (frame_w as f32, frame_h as f32);

    let mut detections = Vec::new();
    for i in 0..anchors {
        let mut best = (0usize, f32::MIN);
        for c in 0..nc {
            let score = output[[0, CXYWH_OFFSET + c, i]];
            if score > best.1 {
                best = (c, score);
            }
        }
        let (class_id, confidence) = best;
        if confidence <= min_confidence {
            continue;
        }

        let Some(class) = labels.get(class_id).and_then(|l| ObjectClass::from_label(l)) else {
            continue;
        };

        let cx = output[[0, 0, i]] / ratio;
        let cy = output[[0, 1, i]] / ratio;
        let w = output[[0, 2, i]] / ratio;
        let h = output[[0, 3, i]] / ratio;

        let bbox = BoundingBox::from_f32(
            (cx - w / 2.0).clamp(0.0, fw),
            (cy - h / 2.0).clamp(0.0, fh),
            (cx + w / 2.0).clamp(0.0, fw),
            (cy + h / 2.0).clamp(0.0, fh),
        );
        detections.push(Detection::new(class, bbox, confidence.min(1.0)));
    }

    Ok(detections)
}

/// Greedy per-class non-maximum suppression, highest confidence first
pub(crate) fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: HashMap<ObjectClass, Vec<BoundingBox>> = HashMap::new();
    let mut out = Vec::with_capacity(detections.len());
    for det in detections {
        let same_class = kept.entry(det.class).or_default();
        if same_class
            .iter()
            .any(|k| iou(k, &det.bbox) > iou_threshold as f64)
        {
            continue;
        }
        same_class.push(det.bbox);
        out.push(det);
    }
    out
}
