//! Per-frame zone membership of detected persons

use detector::{Detection, ObjectClass};
use serde::Serialize;
use zone::{BoundingBox, ZonePolygon};

/// Person detection tagged with whether its center lies in the zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PersonObservation {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub inside_zone: bool,
}

/// Tag every person detection with its zone membership. Other classes are ignored.
pub fn evaluate_membership(detections: &[Detection], zone: &ZonePolygon) -> Vec<PersonObservation> {
    detections
        .iter()
        .filter(|d| d.is(ObjectClass::Person))
        .map(|d| PersonObservation {
            bbox: d.bbox,
            confidence: d.confidence,
            inside_zone: zone.contains_center(&d.bbox),
        })
        .collect()
}

/// Zone is occupied when any observed person is inside it
pub fn any_inside(observations: &[PersonObservation]) -> bool {
    observations.iter().any(|o| o.inside_zone)
}
