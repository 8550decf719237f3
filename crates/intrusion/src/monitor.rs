//! Per-frame zone monitoring pipeline

use detector::Detector;
use event_log::{EntryEvent, EventSummary, RiskLevel};
use frame_source::{
    annotate, EventBanner, FrameSink, FrameSource, OverlayBox, SourceError, VideoFrame,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use zone::ZonePolygon;

use crate::gate::{EntryGate, GateDecision};
use crate::membership::{any_inside, evaluate_membership, PersonObservation};
use crate::ppe::{helmet_boxes, PpeAssociator, PpeConfig, PpeMatch};
use crate::recorder::EventRecorder;
use crate::MonitorError;

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Confidence floor for person detections (exclusive)
    pub person_confidence: f32,
    /// Dead time after a trigger (seconds)
    pub cooldown_seconds: f64,
    /// Helmet association
    pub ppe: PpeConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            person_confidence: 0.35,
            cooldown_seconds: 2.0,
            ppe: PpeConfig::default(),
        }
    }
}

/// What happened on one frame
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    pub frame_index: u64,
    pub observations: Vec<PersonObservation>,
    pub decision: GateDecision,
    pub ppe_match: Option<PpeMatch>,
    pub event: Option<EntryEvent>,
    /// Annotated frame saved as the event snapshot
    pub evidence: Option<VideoFrame>,
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub frames_processed: u64,
    pub frames_skipped: u64,
    pub events: EventSummary,
}

/// Zone entry monitor for a single stream.
///
/// Single-threaded: frames are processed strictly in order and the gate and
/// event log have no other writers.
pub struct ZoneMonitor {
    zone: ZonePolygon,
    config: MonitorConfig,
    gate: EntryGate,
    associator: PpeAssociator,
    person_detector: Box<dyn Detector>,
    helmet_detector: Box<dyn Detector>,
    recorder: EventRecorder,
    frames_processed: u64,
    frames_skipped: u64,
}

impl ZoneMonitor {
    /// Create a monitor. The cooldown is fixed here from the stream's frame rate.
    pub fn new(
        zone: ZonePolygon,
        config: MonitorConfig,
        fps: Option<f64>,
        person_detector: Box<dyn Detector>,
        helmet_detector: Box<dyn Detector>,
        recorder: EventRecorder,
    ) -> Self {
        info!(
            "Creating zone monitor: {} vertices, person detector '{}', helmet detector '{}'",
            zone.len(),
            person_detector.name(),
            helmet_detector.name()
        );
        Self {
            gate: EntryGate::from_fps(fps, config.cooldown_seconds),
            associator: PpeAssociator::new(config.ppe),
            zone,
            config,
            person_detector,
            helmet_detector,
            recorder,
            frames_processed: 0,
            frames_skipped: 0,
        }
    }

    /// Run one frame through membership, gate, PPE and recording.
    ///
    /// A detector error leaves the gate untouched so the frame counts as
    /// never seen.
    pub fn process_frame(&mut self, frame: &VideoFrame) -> Result<FrameOutcome, MonitorError> {
        let frame_index = frame.sequence;

        let persons = self
            .person_detector
            .detect(frame, self.config.person_confidence)
            .map_err(|source| MonitorError::Detector {
                name: self.person_detector.name().to_string(),
                source,
            })?;
        let observations = evaluate_membership(&persons, &self.zone);
        let current_inside = any_inside(&observations);

        let decision = self.gate.peek(frame_index, current_inside);
        let mut ppe_match = None;
        let mut helmet_present = false;

        if decision == GateDecision::Trigger {
            let helmets = self
                .helmet_detector
                .detect(frame, self.config.ppe.helmet_confidence)
                .map_err(|source| MonitorError::Detector {
                    name: self.helmet_detector.name().to_string(),
                    source,
                })?;
            let helmets = helmet_boxes(&helmets, self.config.ppe.helmet_confidence);
            ppe_match = self.associator.associate(&observations, &helmets);
            helmet_present = ppe_match.is_some();
            debug!(
                "Frame {}: {} helmets, match: {:?}",
                frame_index,
                helmets.len(),
                ppe_match
            );
        }

        self.gate.commit(frame_index, current_inside, decision);
        self.frames_processed += 1;
        metrics::counter!("sentry_frames_processed_total").increment(1);

        let (event, evidence) = if decision == GateDecision::Trigger {
            let banner = banner_for(RiskLevel::from_helmet(helmet_present));
            let evidence = match self.render(frame, &observations, Some(banner)) {
                Ok(annotated) => Some(annotated),
                Err(e) => {
                    warn!("Frame {}: overlay failed, saving raw frame: {}", frame_index, e);
                    None
                }
            };
            let snapshot_frame = evidence.as_ref().unwrap_or(frame);
            let event = self
                .recorder
                .record(snapshot_frame, frame_index, helmet_present)?;
            metrics::counter!("sentry_entry_events_total", "risk" => event.risk_level().as_str())
                .increment(1);
            (Some(event), evidence)
        } else {
            (None, None)
        };

        Ok(FrameOutcome {
            frame_index,
            observations,
            decision,
            ppe_match,
            event,
            evidence,
        })
    }

    /// Zone outline and membership-colored person boxes on a copy of `frame`
    fn render(
        &self,
        frame: &VideoFrame,
        observations: &[PersonObservation],
        banner: Option<EventBanner>,
    ) -> Result<VideoFrame, SourceError> {
        let boxes: Vec<OverlayBox> = observations
            .iter()
            .map(|o| OverlayBox {
                bbox: o.bbox,
                inside_zone: o.inside_zone,
            })
            .collect();
        annotate(frame, &self.zone, &boxes, banner)
    }

    /// Consume `source` to the end, writing annotated frames to `sink` if given.
    ///
    /// Undecodable frames and detector failures skip the frame with a warning.
    /// Other source errors and storage errors stop the run; events recorded so
    /// far remain available through [`events`](Self::events).
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        mut sink: Option<&mut dyn FrameSink>,
    ) -> Result<RunSummary, MonitorError> {
        loop {
            let frame = match source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(SourceError::Decode(e)) => {
                    warn!("Skipping undecodable frame: {}", e);
                    self.skip_frame();
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let (observations, evidence) = match self.process_frame(&frame) {
                Ok(outcome) => (outcome.observations, outcome.evidence),
                Err(MonitorError::Detector { name, source }) => {
                    warn!(
                        "Frame {} skipped: detector '{}' failed: {}",
                        frame.sequence, name, source
                    );
                    self.skip_frame();
                    (Vec::new(), None)
                }
                Err(e) => return Err(e),
            };

            if let Some(sink) = sink.as_mut() {
                let written = match evidence {
                    Some(annotated) => Ok(annotated),
                    None => self.render(&frame, &observations, None),
                }
                .and_then(|annotated| sink.write_frame(&annotated));
                if let Err(e) = written {
                    warn!("Annotated frame {} not written: {}", frame.sequence, e);
                }
            }
        }

        if let Some(sink) = sink.as_mut() {
            if let Err(e) = sink.finish() {
                warn!("Annotated output not finalized: {}", e);
            }
        }

        let summary = self.summary();
        info!(
            "Run complete: {} frames processed, {} skipped, {} events ({} HIGH, {} LOW)",
            summary.frames_processed,
            summary.frames_skipped,
            summary.events.total,
            summary.events.high,
            summary.events.low
        );
        Ok(summary)
    }

    fn skip_frame(&mut self) {
        self.frames_skipped += 1;
        metrics::counter!("sentry_frames_skipped_total").increment(1);
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            frames_processed: self.frames_processed,
            frames_skipped: self.frames_skipped,
            events: EventSummary::from_events(self.recorder.events()),
        }
    }

    /// Events recorded so far, in trigger order
    pub fn events(&self) -> &[EntryEvent] {
        self.recorder.events()
    }

    pub fn gate(&self) -> &EntryGate {
        &self.gate
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> EventRecorder {
        self.recorder
    }
}

fn banner_for(risk: RiskLevel) -> EventBanner {
    match risk {
        RiskLevel::High => EventBanner::HighRisk,
        RiskLevel::Low => EventBanner::LowRisk,
    }
}
