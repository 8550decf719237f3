//! Helmet association for persons inside the zone

use detector::{Detection, ObjectClass};
use serde::{Deserialize, Serialize};
use zone::{iou, BoundingBox};

use crate::membership::PersonObservation;

/// PPE association tunables
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PpeConfig {
    /// Top share of a person box treated as the head region
    pub head_fraction: f64,
    /// Minimum head/helmet IOU (exclusive) for a helmet to count
    pub iou_threshold: f64,
    /// Confidence floor for helmet detections (exclusive)
    pub helmet_confidence: f32,
}

impl Default for PpeConfig {
    fn default() -> Self {
        Self {
            head_fraction: 0.35,
            iou_threshold: 0.05,
            helmet_confidence: 0.30,
        }
    }
}

/// First qualifying person/helmet pairing
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PpeMatch {
    pub person: BoundingBox,
    pub head: BoundingBox,
    pub helmet: BoundingBox,
    pub iou: f64,
}

/// Positive helmet boxes from a helmet-detector result.
///
/// This is the one place helmet output is filtered: only `Hardhat` detections
/// above the confidence floor survive.
pub fn helmet_boxes(detections: &[Detection], min_confidence: f32) -> Vec<BoundingBox> {
    detections
        .iter()
        .filter(|d| d.is(ObjectClass::Hardhat) && d.confidence > min_confidence)
        .map(|d| d.bbox)
        .collect()
}

/// Decides whether any intruding person wears a helmet
#[derive(Debug, Clone, Default)]
pub struct PpeAssociator {
    config: PpeConfig,
}

impl PpeAssociator {
    pub fn new(config: PpeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PpeConfig {
        &self.config
    }

    /// Existence check: returns the first inside-zone person whose head region
    /// overlaps a helmet box by more than the IOU threshold. No ranking of
    /// multiple candidates.
    pub fn associate(
        &self,
        persons: &[PersonObservation],
        helmets: &[BoundingBox],
    ) -> Option<PpeMatch> {
        persons
            .iter()
            .filter(|p| p.inside_zone)
            .find_map(|p| {
                let head = p.bbox.top_fraction(self.config.head_fraction);
                helmets.iter().find_map(|h| {
                    let overlap = iou(&head, h);
                    (overlap > self.config.iou_threshold).then_some(PpeMatch {
                        person: p.bbox,
                        head,
                        helmet: *h,
                        iou: overlap,
                    })
                })
            })
    }

    /// `true` when at least one intruding person has a helmet
    pub fn helmet_present(&self, persons: &[PersonObservation], helmets: &[BoundingBox]) -> bool {
        self.associate(persons, helmets).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(x1: i32, y1: i32, x2: i32, y2: i32, inside_zone: bool) -> PersonObservation {
        PersonObservation {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            confidence: 0.9,
            inside_zone,
        }
    }

    #[test]
    fn test_helmet_on_head_region() {
        let associator = PpeAssociator::default();
        let persons = [person(10, 10, 50, 90, true)];
        let helmets = [BoundingBox::new(12, 10, 48, 30)];

        let m = associator.associate(&persons, &helmets).unwrap();
        assert_eq!(m.head, BoundingBox::new(10, 10, 50, 38));
        assert!(m.iou > 0.05);
        assert!(associator.helmet_present(&persons, &helmets));
    }

    #[test]
    fn test_no_helmets_means_absent() {
        let associator = PpeAssociator::default();
        assert!(!associator.helmet_present(&[person(10, 10, 50, 90, true)], &[]));
    }

    #[test]
    fn test_helmet_at_feet_does_not_count() {
        let associator = PpeAssociator::default();
        let persons = [person(10, 10, 50, 90, true)];
        let helmets = [BoundingBox::new(12, 70, 48, 90)];
        assert!(!associator.helmet_present(&persons, &helmets));
    }

    #[test]
    fn test_outside_person_helmet_ignored() {
        let associator = PpeAssociator::default();
        let persons = [
            person(10, 10, 50, 90, true),
            person(200, 10, 240, 90, false),
        ];
        let helmets = [BoundingBox::new(202, 10, 238, 30)];
        assert!(!associator.helmet_present(&persons, &helmets));
    }

    #[test]
    fn test_any_inside_person_suffices() {
        let associator = PpeAssociator::default();
        let persons = [
            person(10, 10, 50, 90, true),
            person(60, 10, 100, 90, true),
        ];
        let helmets = [BoundingBox::new(62, 10, 98, 30)];
        let m = associator.associate(&persons, &helmets).unwrap();
        assert_eq!(m.person, BoundingBox::new(60, 10, 100, 90));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let associator = PpeAssociator::new(PpeConfig {
            iou_threshold: 720.0 / 1120.0,
            ..Default::default()
        });
        let persons = [person(10, 10, 50, 90, true)];
        let helmets = [BoundingBox::new(12, 10, 48, 30)];
        assert!(!associator.helmet_present(&persons, &helmets));
    }

    #[test]
    fn test_helmet_filter_single_pass() {
        let dets = vec![
            Detection::new(ObjectClass::Hardhat, BoundingBox::new(0, 0, 5, 5), 0.9),
            Detection::new(ObjectClass::Hardhat, BoundingBox::new(0, 0, 6, 6), 0.3),
            Detection::new(ObjectClass::Person, BoundingBox::new(0, 0, 7, 7), 0.9),
        ];
        assert_eq!(helmet_boxes(&dets, 0.30), vec![BoundingBox::new(0, 0, 5, 5)]);
    }
}
