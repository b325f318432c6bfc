//! Reason codes for evaluations and step changes

use serde::{Deserialize, Serialize};

/// Reason codes for every evaluation outcome and step change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // R001: Session commands
    // =========================================================================
    /// start() accepted, challenges begin
    R001_SESSION_STARTED,
    /// reset() accepted, back to waiting
    R001_SESSION_RESET,

    // =========================================================================
    // R002: Current step
    // =========================================================================
    R002_STEP_WAITING,
    R002_STEP_LOOK_RIGHT,
    R002_STEP_LOOK_LEFT,
    R002_STEP_BLINK,
    R002_STEP_COMPLETED,

    // =========================================================================
    // R003: Dwell gate
    // =========================================================================
    /// Condition met but step entered less than the dwell time ago
    R003_DWELL_ACCUMULATING,

    // =========================================================================
    // R004: Measurement thresholds
    // =========================================================================
    /// Head not turned far enough right
    R004_YAW_NOT_RIGHT,
    /// Head not turned far enough left
    R004_YAW_NOT_LEFT,
    /// Eyes neither clearly closed nor clearly open
    R004_EYES_INDETERMINATE,

    // =========================================================================
    // R005: Transitions
    // =========================================================================
    R005_TRANSITION_TO_LOOK_LEFT,
    R005_TRANSITION_TO_BLINK,
    R005_TRANSITION_TO_COMPLETED,

    // =========================================================================
    // R006: Blink validation
    // =========================================================================
    /// Waiting for eyes to close
    R006_AWAITING_CLOSED,
    /// Eyes closed, latch set
    R006_BLINK_LATCHED,
    /// Latched, waiting for eyes to reopen
    R006_AWAITING_OPEN,
    /// Eyes reopened too soon after closing
    R006_BLINK_TOO_FAST,
    /// Eyes reopened too late after closing
    R006_BLINK_TOO_SLOW,

    // =========================================================================
    // R007: Frame handling
    // =========================================================================
    /// No face in frame
    R007_NO_FACE,
    /// Frame tagged with a superseded generation
    R007_STALE_GENERATION,
    /// Detector failed on this frame
    R007_DETECTOR_FAILURE,
    /// No session in progress
    R007_SESSION_IDLE,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::R001_SESSION_STARTED => "R001_SESSION_STARTED",
            Self::R001_SESSION_RESET => "R001_SESSION_RESET",
            Self::R002_STEP_WAITING => "R002_STEP_WAITING",
            Self::R002_STEP_LOOK_RIGHT => "R002_STEP_LOOK_RIGHT",
            Self::R002_STEP_LOOK_LEFT => "R002_STEP_LOOK_LEFT",
            Self::R002_STEP_BLINK => "R002_STEP_BLINK",
            Self::R002_STEP_COMPLETED => "R002_STEP_COMPLETED",
            Self::R003_DWELL_ACCUMULATING => "R003_DWELL_ACCUMULATING",
            Self::R004_YAW_NOT_RIGHT => "R004_YAW_NOT_RIGHT",
            Self::R004_YAW_NOT_LEFT => "R004_YAW_NOT_LEFT",
            Self::R004_EYES_INDETERMINATE => "R004_EYES_INDETERMINATE",
            Self::R005_TRANSITION_TO_LOOK_LEFT => "R005_TRANSITION_TO_LOOK_LEFT",
            Self::R005_TRANSITION_TO_BLINK => "R005_TRANSITION_TO_BLINK",
            Self::R005_TRANSITION_TO_COMPLETED => "R005_TRANSITION_TO_COMPLETED",
            Self::R006_AWAITING_CLOSED => "R006_AWAITING_CLOSED",
            Self::R006_BLINK_LATCHED => "R006_BLINK_LATCHED",
            Self::R006_AWAITING_OPEN => "R006_AWAITING_OPEN",
            Self::R006_BLINK_TOO_FAST => "R006_BLINK_TOO_FAST",
            Self::R006_BLINK_TOO_SLOW => "R006_BLINK_TOO_SLOW",
            Self::R007_NO_FACE => "R007_NO_FACE",
            Self::R007_STALE_GENERATION => "R007_STALE_GENERATION",
            Self::R007_DETECTOR_FAILURE => "R007_DETECTOR_FAILURE",
            Self::R007_SESSION_IDLE => "R007_SESSION_IDLE",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::R001_SESSION_STARTED => "Liveness test started",
            Self::R001_SESSION_RESET => "Liveness test reset",
            Self::R002_STEP_WAITING => "Waiting for start",
            Self::R002_STEP_LOOK_RIGHT => "Waiting for head turn right",
            Self::R002_STEP_LOOK_LEFT => "Waiting for head turn left",
            Self::R002_STEP_BLINK => "Waiting for blink",
            Self::R002_STEP_COMPLETED => "Liveness verified",
            Self::R003_DWELL_ACCUMULATING => "Condition met, dwell time not reached",
            Self::R004_YAW_NOT_RIGHT => "Yaw above right-turn threshold",
            Self::R004_YAW_NOT_LEFT => "Yaw below left-turn threshold",
            Self::R004_EYES_INDETERMINATE => "Eyes neither closed nor open",
            Self::R005_TRANSITION_TO_LOOK_LEFT => "Moving to LOOK_LEFT",
            Self::R005_TRANSITION_TO_BLINK => "Moving to BLINK",
            Self::R005_TRANSITION_TO_COMPLETED => "Blink validated, test completed",
            Self::R006_AWAITING_CLOSED => "Waiting for eyes to close",
            Self::R006_BLINK_LATCHED => "Eyes closed, blink latched",
            Self::R006_AWAITING_OPEN => "Waiting for eyes to reopen",
            Self::R006_BLINK_TOO_FAST => "Eyes reopened too quickly",
            Self::R006_BLINK_TOO_SLOW => "Eyes reopened too slowly",
            Self::R007_NO_FACE => "No face in frame",
            Self::R007_STALE_GENERATION => "Frame belongs to a superseded session",
            Self::R007_DETECTOR_FAILURE => "Detector failed on frame",
            Self::R007_SESSION_IDLE => "No test in progress",
        }
    }

    /// Steady-state reason for a step
    pub fn for_step(step: crate::types::LivenessStep) -> Self {
        use crate::types::LivenessStep;
        match step {
            LivenessStep::Waiting => Self::R002_STEP_WAITING,
            LivenessStep::LookRight => Self::R002_STEP_LOOK_RIGHT,
            LivenessStep::LookLeft => Self::R002_STEP_LOOK_LEFT,
            LivenessStep::Blink => Self::R002_STEP_BLINK,
            LivenessStep::Completed => Self::R002_STEP_COMPLETED,
        }
    }

    /// Reason recorded when entering `step` through a transition
    pub fn entering(step: crate::types::LivenessStep) -> Self {
        use crate::types::LivenessStep;
        match step {
            LivenessStep::LookLeft => Self::R005_TRANSITION_TO_LOOK_LEFT,
            LivenessStep::Blink => Self::R005_TRANSITION_TO_BLINK,
            LivenessStep::Completed => Self::R005_TRANSITION_TO_COMPLETED,
            LivenessStep::LookRight => Self::R001_SESSION_STARTED,
            LivenessStep::Waiting => Self::R001_SESSION_RESET,
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}
