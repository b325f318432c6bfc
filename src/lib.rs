//! Vivacity: challenge-response face liveness verification
//!
//! Measurements flow: frame source → detector → FaceMeasurement →
//! SessionController → LivenessStateMachine → StepChanged event

pub mod core;
pub mod error;
pub mod types;

pub use error::{LivenessError, Result};

// =============================================================================
// HEAD ROTATION [C]
// =============================================================================

/// |yaw| that must be exceeded for a look-right / look-left challenge (degrees).
/// Front camera: looking right gives negative yaw, looking left positive.
pub const YAW_THRESHOLD_DEG: f64 = 15.0;

/// Minimum time in a step before it may be left (milliseconds)
pub const STEP_DWELL_MS: u64 = 1000;

// =============================================================================
// BLINK [C]
// =============================================================================

/// Both eyes below this probability = eyes closed
pub const EYES_CLOSED_THRESHOLD: f64 = 0.3;

/// Both eyes above this probability = eyes open
pub const EYES_OPEN_THRESHOLD: f64 = 0.7;

/// Closed → open gap must be strictly greater than this (milliseconds)
pub const BLINK_MIN_MS: u64 = 200;

/// Closed → open gap must be strictly less than this (milliseconds)
pub const BLINK_MAX_MS: u64 = 1000;

// =============================================================================
// DIAGNOSTICS / PLUMBING
// =============================================================================

/// Rolling window for the fps counter (milliseconds)
pub const FPS_WINDOW_MS: u64 = 1000;

/// Buffered step-changed events per subscriber before it starts lagging
pub const EVENT_CHANNEL_CAPACITY: usize = 100;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
