//! Detection record and the class allow-list

use serde::{Deserialize, Serialize};
use std::fmt;
use zone::BoundingBox;

/// Object classes the monitor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    /// Person (COCO "person")
    Person,
    /// Helmet worn (positive PPE class, "Hardhat")
    Hardhat,
}

impl ObjectClass {
    /// Map a model label onto the allow-list (case-insensitive).
    ///
    /// Anything else, including negative classes like "NO-Hardhat", yields `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "person" => Some(ObjectClass::Person),
            "hardhat" => Some(ObjectClass::Hardhat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Person => "person",
            ObjectClass::Hardhat => "hardhat",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single detector hit in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class: ObjectClass,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl Detection {
    pub fn new(class: ObjectClass, bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            class,
            bbox,
            confidence,
        }
    }

    pub fn is(&self, class: ObjectClass) -> bool {
        self.class == class
    }
}

/// Untyped detector output as produced by a model or a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub bbox: BoundingBox,
    pub confidence: f32,
}

impl RawDetection {
    /// Validate against the allow-list. Unknown labels and non-finite or
    /// out-of-range confidences are rejected.
    pub fn validate(&self) -> Option<Detection> {
        let class = ObjectClass::from_label(&self.label)?;
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return None;
        }
        Some(Detection::new(class, self.bbox, self.confidence))
    }
}
