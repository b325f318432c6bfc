//! Tunable liveness thresholds

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LivenessError, Result};
use crate::{
    BLINK_MAX_MS, BLINK_MIN_MS, EYES_CLOSED_THRESHOLD, EYES_OPEN_THRESHOLD, FPS_WINDOW_MS,
    STEP_DWELL_MS, YAW_THRESHOLD_DEG,
};

/// Thresholds used by the state machine and diagnostics.
/// Missing JSON fields fall back to the crate constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub yaw_threshold_deg: f64,
    pub dwell_ms: u64,
    pub eyes_closed_threshold: f64,
    pub eyes_open_threshold: f64,
    pub blink_min_ms: u64,
    pub blink_max_ms: u64,
    /// Clear the blink latch when a reopen falls outside the valid window,
    /// so the next closed-eyes frame starts a fresh measurement
    pub rearm_on_rejected_blink: bool,
    pub fps_window_ms: u64,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            yaw_threshold_deg: YAW_THRESHOLD_DEG,
            dwell_ms: STEP_DWELL_MS,
            eyes_closed_threshold: EYES_CLOSED_THRESHOLD,
            eyes_open_threshold: EYES_OPEN_THRESHOLD,
            blink_min_ms: BLINK_MIN_MS,
            blink_max_ms: BLINK_MAX_MS,
            rearm_on_rejected_blink: true,
            fps_window_ms: FPS_WINDOW_MS,
        }
    }
}

impl LivenessConfig {
    /// Load and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LivenessConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.yaw_threshold_deg > 0.0) {
            return Err(LivenessError::InvalidConfig(format!(
                "yaw_threshold_deg must be positive, got {}",
                self.yaw_threshold_deg
            )));
        }
        for (name, value) in [
            ("eyes_closed_threshold", self.eyes_closed_threshold),
            ("eyes_open_threshold", self.eyes_open_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(LivenessError::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        if self.eyes_closed_threshold >= self.eyes_open_threshold {
            return Err(LivenessError::InvalidConfig(
                "eyes_closed_threshold must be below eyes_open_threshold".to_string(),
            ));
        }
        if self.blink_min_ms >= self.blink_max_ms {
            return Err(LivenessError::InvalidConfig(
                "blink_min_ms must be below blink_max_ms".to_string(),
            ));
        }
        if self.fps_window_ms == 0 {
            return Err(LivenessError::InvalidConfig(
                "fps_window_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(LivenessConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LivenessConfig = serde_json::from_str(r#"{"dwell_ms": 1500}"#).unwrap();
        assert_eq!(config.dwell_ms, 1500);
        assert_eq!(config.yaw_threshold_deg, YAW_THRESHOLD_DEG);
        assert!(config.rearm_on_rejected_blink);
    }

    #[test]
    fn test_rejects_inverted_eye_thresholds() {
        let config = LivenessConfig {
            eyes_closed_threshold: 0.8,
            eyes_open_threshold: 0.2,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(LivenessError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_empty_blink_window() {
        let config = LivenessConfig {
            blink_min_ms: 1000,
            blink_max_ms: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_yaw() {
        let config = LivenessConfig {
            yaw_threshold_deg: f64::NAN,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
