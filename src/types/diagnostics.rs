//! Debug overlay data

use serde::{Deserialize, Serialize};

/// Latest frame statistics for operator visibility
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    /// Frames per second over the last completed window
    pub fps: u32,
    /// Faces in the last frame
    pub face_count: usize,
    /// Primary face values from the last frame, if any
    pub yaw_angle: Option<f64>,
    pub left_eye_open: Option<f64>,
    pub right_eye_open: Option<f64>,
}

impl DiagnosticsSnapshot {
    /// Single-line overlay text
    pub fn to_overlay_string(&self) -> String {
        let mut line = format!("FPS: {} | Faces: {}", self.fps, self.face_count);
        if let Some(yaw) = self.yaw_angle {
            line.push_str(&format!(" | Yaw: {:.1}°", yaw));
        }
        if let (Some(left), Some(right)) = (self.left_eye_open, self.right_eye_open) {
            line.push_str(&format!(
                " | Eye L: {:.0}% | Eye R: {:.0}%",
                left * 100.0,
                right * 100.0
            ));
        }
        line
    }
}
