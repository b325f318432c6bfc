//! Step-changed notifications and terminal rendering

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use crate::types::{LivenessStatus, LivenessStep, ReasonCode};

/// Emitted to the presentation layer on every committed step change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepChanged {
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// Session generation the change belongs to
    pub generation: u64,
    /// New step
    pub step: LivenessStep,
    /// Status derived from the new step
    pub status: LivenessStatus,
    /// Why the step changed
    pub reason: ReasonCode,
}

impl StepChanged {
    /// Create new event
    pub fn new(generation: u64, step: LivenessStep, reason: ReasonCode) -> Self {
        Self {
            timestamp: Utc::now(),
            generation,
            step,
            status: step.status(),
            reason,
        }
    }

    /// Instruction text for the new step
    pub fn instruction(&self) -> &'static str {
        self.step.instruction()
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        let color = self.status.color_code();
        let reset = LivenessStatus::color_reset();

        format!(
            "{}{} step={} | status={} | gen={} | {} | {}{}",
            color,
            self.step.emoji(),
            self.step,
            self.status,
            self.generation,
            self.instruction(),
            self.reason.code(),
            reset
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "step={} | status={} | gen={} | reason={}",
            self.step,
            self.status,
            self.generation,
            self.reason.code()
        )
    }
}
