//! `sentry run`: wire the pipeline together and process one stream

use anyhow::{Context, Result};
use detector::{Detector, OnnxDetector, ReplayDetector, YoloConfig};
use event_log::{EventStore, SnapshotStore};
use frame_source::{FrameSink, FrameSource, ImageSequenceSink, ImageSequenceSource};
use intrusion::{EventRecorder, RunSummary, ZoneMonitor};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use crate::config::{Backend, DetectionConfig, SentryConfig};
use crate::metrics::write_metrics;

/// A configured run whose inputs and outputs are all open
pub struct Pipeline {
    monitor: ZoneMonitor,
    source: ImageSequenceSource,
    sink: Option<ImageSequenceSink>,
    log_path: PathBuf,
    export_path: PathBuf,
}

impl Pipeline {
    /// Open inputs, then outputs.
    ///
    /// Everything that can fail at setup (config, source, models) is checked
    /// before the first output file or directory is created. A JSON export
    /// left by an earlier run is removed so it cannot be mistaken for this one.
    pub fn setup(cfg: &SentryConfig) -> Result<Self> {
        let zone = cfg.validate()?;

        let source = ImageSequenceSource::open(&cfg.video.source, cfg.video.fps)
            .with_context(|| format!("Cannot open video source {}", cfg.video.source.display()))?;
        let (person, helmet) = build_detectors(&cfg.detection)?;

        let store = EventStore::open(&cfg.events.log_path)?;
        let snapshots = SnapshotStore::create(&cfg.events.snapshot_dir)?;
        let sink = cfg
            .annotated_output()
            .map(ImageSequenceSink::create)
            .transpose()?;
        remove_stale_export(&cfg.events.export_path);

        let monitor = ZoneMonitor::new(
            zone,
            cfg.monitor_config(),
            source.fps(),
            person,
            helmet,
            EventRecorder::new(store, Some(snapshots)),
        );

        Ok(Self {
            monitor,
            source,
            sink,
            log_path: cfg.events.log_path.clone(),
            export_path: cfg.events.export_path.clone(),
        })
    }

    /// Process the stream to its end, then write the JSON array export.
    ///
    /// The export is written even when processing stopped early; the JSONL
    /// log already holds every event by then.
    pub fn run(mut self) -> Result<RunSummary> {
        let result = self.monitor.run(
            &mut self.source,
            self.sink.as_mut().map(|s| s as &mut dyn FrameSink),
        );

        let exported = export(&self.monitor, &self.export_path);
        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                if let Err(export_err) = exported {
                    error!("{:#}", export_err);
                }
                return Err(e).context("Processing stopped");
            }
        };
        exported?;

        info!("Event log: {}", self.log_path.display());
        Ok(summary)
    }
}

/// Process the configured stream end to end
pub fn run_pipeline(cfg: &SentryConfig) -> Result<RunSummary> {
    Pipeline::setup(cfg)?.run()
}

/// [`run_pipeline`], writing the metrics exposition to `metrics_out` once
/// setup has succeeded. A setup failure leaves no metrics file behind.
pub fn run_with_metrics(
    cfg: &SentryConfig,
    metrics: &PrometheusHandle,
    metrics_out: Option<&Path>,
) -> Result<RunSummary> {
    let pipeline = Pipeline::setup(cfg)?;
    let result = pipeline.run();

    if let Some(path) = metrics_out {
        if let Err(e) = write_metrics(metrics, path) {
            if result.is_ok() {
                return Err(e);
            }
            error!("{:#}", e);
        }
    }
    result
}

fn remove_stale_export(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => info!("Removed previous export {}", path.display()),
        Err(e) => warn!("Previous export {} not removed: {}", path.display(), e),
    }
}

fn export(monitor: &ZoneMonitor, path: &Path) -> Result<()> {
    monitor
        .recorder()
        .store()
        .export_json(path)
        .with_context(|| format!("Cannot export events to {}", path.display()))
}

/// Person and helmet detectors for the configured backend
pub fn build_detectors(
    cfg: &DetectionConfig,
) -> Result<(Box<dyn Detector>, Box<dyn Detector>)> {
    match cfg.backend {
        Backend::Onnx => {
            let person = OnnxDetector::load(
                "person",
                YoloConfig {
                    model_path: cfg.person_model.clone(),
                    labels: cfg.person_labels.clone(),
                    input_size: cfg.input_size,
                    nms_iou: cfg.nms_iou,
                },
            )
            .context("Cannot load person model")?;
            let helmet = OnnxDetector::load(
                "helmet",
                YoloConfig {
                    model_path: cfg.helmet_model.clone(),
                    labels: cfg.helmet_labels.clone(),
                    input_size: cfg.input_size,
                    nms_iou: cfg.nms_iou,
                },
            )
            .context("Cannot load helmet model")?;
            Ok((Box::new(person), Box::new(helmet)))
        }
        Backend::Replay => {
            let person_path = cfg
                .person_replay
                .as_ref()
                .context("detection.person_replay is not set")?;
            let helmet_path = cfg
                .helmet_replay
                .as_ref()
                .context("detection.helmet_replay is not set")?;
            let person = ReplayDetector::load("person", person_path)?;
            let helmet = ReplayDetector::load("helmet", helmet_path)?;
            Ok((Box::new(person), Box::new(helmet)))
        }
    }
}
