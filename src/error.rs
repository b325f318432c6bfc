//! Error types for Vivacity.
//!
//! Per-frame conditions (no face, stale generation, detector failure) are
//! not errors; they surface as `FeedOutcome` variants.

use thiserror::Error;

use crate::types::LivenessStep;

#[derive(Error, Debug)]
pub enum LivenessError {
    #[error("Session already in progress (step {step})")]
    AlreadyInProgress { step: LivenessStep },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid trace at line {line}: {message}")]
    InvalidTrace { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LivenessError>;

/// Failure reported by the external face detector for a single frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Detector failure: {0}")]
pub struct DetectorError(pub String);
