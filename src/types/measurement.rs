//! Per-frame face measurements produced by the external detector

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::error::DetectorError;

/// Face bounding box in preview coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One detected face in one frame. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceMeasurement {
    /// Horizontal head rotation, signed degrees (camera frame)
    pub yaw_angle: f64,
    /// Confidence the left eye is open (0.0-1.0)
    pub left_eye_open_probability: f64,
    /// Confidence the right eye is open (0.0-1.0)
    pub right_eye_open_probability: f64,
    #[serde(default)]
    pub bounds: BoundingBox,
    /// When the frame was captured
    #[serde(default = "Utc::now")]
    pub captured_at: DateTime<Utc>,
}

impl FaceMeasurement {
    /// Create a measurement captured now with an empty bounding box
    pub fn new(yaw_angle: f64, left_eye_open: f64, right_eye_open: f64) -> Self {
        Self {
            yaw_angle,
            left_eye_open_probability: left_eye_open,
            right_eye_open_probability: right_eye_open,
            bounds: BoundingBox::default(),
            captured_at: Utc::now(),
        }
    }

    /// Both eyes below `threshold`
    pub fn eyes_closed(&self, threshold: f64) -> bool {
        self.left_eye_open_probability < threshold && self.right_eye_open_probability < threshold
    }

    /// Both eyes above `threshold`
    pub fn eyes_open(&self, threshold: f64) -> bool {
        self.left_eye_open_probability > threshold && self.right_eye_open_probability > threshold
    }
}

/// Detector output for a single frame: zero or more faces, or a failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    #[serde(default)]
    pub faces: Vec<FaceMeasurement>,
    /// Set when the detector failed on this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FrameReport {
    pub fn with_faces(faces: Vec<FaceMeasurement>) -> Self {
        Self { faces, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { faces: Vec::new(), error: Some(message.into()) }
    }

    /// Primary face. No identity continuity across frames is assumed.
    pub fn primary(&self) -> Option<&FaceMeasurement> {
        self.faces.first()
    }

    /// View as the detector's result
    pub fn as_result(&self) -> Result<&[FaceMeasurement], DetectorError> {
        match &self.error {
            Some(message) => Err(DetectorError(message.clone())),
            None => Ok(&self.faces),
        }
    }
}
