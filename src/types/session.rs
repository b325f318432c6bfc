//! The single mutable liveness session record

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{LivenessStatus, LivenessStep, ReasonCode};

/// Change to commit against a session, produced by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to the given step
    Advance(LivenessStep),
    /// Eyes seen closed: set the blink latch at `now`
    LatchBlink,
    /// Reopen outside the valid window: clear the latch
    RearmBlink,
}

/// Session state. Only mutated through `begin`, `clear` and `apply`.
#[derive(Debug, Clone)]
pub struct LivenessSession {
    step: LivenessStep,
    step_started_at: Instant,
    blink_detected: bool,
    last_blink_at: Option<Instant>,
    generation: u64,
}

impl LivenessSession {
    /// Fresh pending session at generation 0
    pub fn new(now: Instant) -> Self {
        Self {
            step: LivenessStep::Waiting,
            step_started_at: now,
            blink_detected: false,
            last_blink_at: None,
            generation: 0,
        }
    }

    pub fn step(&self) -> LivenessStep {
        self.step
    }

    pub fn status(&self) -> LivenessStatus {
        self.step.status()
    }

    pub fn step_started_at(&self) -> Instant {
        self.step_started_at
    }

    pub fn blink_detected(&self) -> bool {
        self.blink_detected
    }

    pub fn last_blink_at(&self) -> Option<Instant> {
        self.last_blink_at
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Milliseconds spent in the current step at `now`
    pub fn elapsed_in_step_ms(&self, now: Instant) -> u64 {
        now.saturating_duration_since(self.step_started_at).as_millis() as u64
    }

    /// Replace with a session at the first challenge, next generation
    pub fn begin(&mut self, now: Instant) {
        *self = Self {
            step: LivenessStep::LookRight,
            step_started_at: now,
            blink_detected: false,
            last_blink_at: None,
            generation: self.generation + 1,
        };
    }

    /// Replace with a pending session, next generation
    pub fn clear(&mut self, now: Instant) {
        *self = Self {
            generation: self.generation + 1,
            ..Self::new(now)
        };
    }

    /// Commit a transition
    pub fn apply(&mut self, transition: Transition, now: Instant) {
        match transition {
            Transition::Advance(step) => {
                self.step = step;
                self.step_started_at = now;
                if step == LivenessStep::Blink {
                    self.blink_detected = false;
                    self.last_blink_at = None;
                }
            }
            Transition::LatchBlink => {
                self.blink_detected = true;
                self.last_blink_at = Some(now);
            }
            Transition::RearmBlink => {
                self.blink_detected = false;
                self.last_blink_at = None;
            }
        }
    }

    /// Serializable view at `now`
    pub fn snapshot(&self, now: Instant) -> SessionSnapshot {
        SessionSnapshot {
            generation: self.generation,
            step: self.step,
            status: self.status(),
            instruction: self.step.instruction().to_string(),
            status_color: self.status().color_hex().to_string(),
            elapsed_in_step_ms: self.elapsed_in_step_ms(now),
            blink_detected: self.blink_detected,
            reason: ReasonCode::for_step(self.step),
        }
    }
}

/// Point-in-time view of the session for status endpoints and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub step: LivenessStep,
    pub status: LivenessStatus,
    pub instruction: String,
    pub status_color: String,
    pub elapsed_in_step_ms: u64,
    pub blink_detected: bool,
    pub reason: ReasonCode,
}
