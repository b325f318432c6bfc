//! Liveness state machine: pure step-transition logic
//!
//! Step transitions (wall-clock gated, never frame-count gated):
//! - LOOK_RIGHT → LOOK_LEFT: yaw < -15° AND in step ≥ 1000 ms
//! - LOOK_LEFT → BLINK: yaw > 15° AND in step ≥ 1000 ms
//! - BLINK → COMPLETED: eyes closed, then eyes open 200-1000 ms later (exclusive)
//!
//! WAITING → LOOK_RIGHT only happens through start(). COMPLETED is terminal.

use std::time::{Duration, Instant};

use crate::types::{
    FaceMeasurement, LivenessConfig, LivenessSession, LivenessStatus, LivenessStep, ReasonCode,
    Transition,
};

/// Result of evaluating one measurement against the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Change to commit, if any
    pub transition: Option<Transition>,
    pub reason: ReasonCode,
}

impl Evaluation {
    fn hold(reason: ReasonCode) -> Self {
        Self { transition: None, reason }
    }

    fn commit(transition: Transition, reason: ReasonCode) -> Self {
        Self { transition: Some(transition), reason }
    }

    /// Step this evaluation advances to, if it advances
    pub fn next_step(&self) -> Option<LivenessStep> {
        match self.transition {
            Some(Transition::Advance(step)) => Some(step),
            _ => None,
        }
    }
}

/// Stateless evaluator; the session is always read at evaluation time
#[derive(Debug, Clone, Default)]
pub struct LivenessStateMachine {
    config: LivenessConfig,
}

impl LivenessStateMachine {
    pub fn new(config: LivenessConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// Decide what `measurement` at `now` does to `session`.
    /// Only meaningful while the session is in progress.
    pub fn evaluate(
        &self,
        session: &LivenessSession,
        measurement: &FaceMeasurement,
        now: Instant,
    ) -> Evaluation {
        if session.status() != LivenessStatus::InProgress {
            return Evaluation::hold(ReasonCode::R007_SESSION_IDLE);
        }

        let dwell_reached = session.elapsed_in_step_ms(now) >= self.config.dwell_ms;
        let yaw = measurement.yaw_angle;

        match session.step() {
            LivenessStep::LookRight => {
                // Front camera: looking right = negative yaw
                self.gate_head_turn(yaw < -self.config.yaw_threshold_deg, dwell_reached, session.step())
                    .unwrap_or(Evaluation::hold(ReasonCode::R004_YAW_NOT_RIGHT))
            }
            LivenessStep::LookLeft => {
                self.gate_head_turn(yaw > self.config.yaw_threshold_deg, dwell_reached, session.step())
                    .unwrap_or(Evaluation::hold(ReasonCode::R004_YAW_NOT_LEFT))
            }
            LivenessStep::Blink => self.evaluate_blink(session, measurement, now),
            LivenessStep::Waiting | LivenessStep::Completed => {
                Evaluation::hold(ReasonCode::R007_SESSION_IDLE)
            }
        }
    }

    /// None when the angle condition does not hold
    fn gate_head_turn(
        &self,
        condition: bool,
        dwell_reached: bool,
        step: LivenessStep,
    ) -> Option<Evaluation> {
        if !condition {
            return None;
        }
        if !dwell_reached {
            return Some(Evaluation::hold(ReasonCode::R003_DWELL_ACCUMULATING));
        }
        let next = step.next()?;
        Some(Evaluation::commit(Transition::Advance(next), ReasonCode::entering(next)))
    }

    fn evaluate_blink(
        &self,
        session: &LivenessSession,
        measurement: &FaceMeasurement,
        now: Instant,
    ) -> Evaluation {
        let latched_at = session
            .last_blink_at()
            .filter(|_| session.blink_detected());

        if measurement.eyes_closed(self.config.eyes_closed_threshold) {
            // Phase A: first closed frame latches; later ones keep its timestamp
            return match latched_at {
                None => Evaluation::commit(Transition::LatchBlink, ReasonCode::R006_BLINK_LATCHED),
                Some(_) => Evaluation::hold(ReasonCode::R006_AWAITING_OPEN),
            };
        }

        if !measurement.eyes_open(self.config.eyes_open_threshold) {
            return Evaluation::hold(ReasonCode::R004_EYES_INDETERMINATE);
        }

        // Phase B: eyes open
        let Some(closed_at) = latched_at else {
            return Evaluation::hold(ReasonCode::R006_AWAITING_CLOSED);
        };

        let gap = now.saturating_duration_since(closed_at);
        let min = Duration::from_millis(self.config.blink_min_ms);
        let max = Duration::from_millis(self.config.blink_max_ms);

        if gap > min && gap < max {
            return Evaluation::commit(
                Transition::Advance(LivenessStep::Completed),
                ReasonCode::R005_TRANSITION_TO_COMPLETED,
            );
        }

        let reason = if gap <= min {
            ReasonCode::R006_BLINK_TOO_FAST
        } else {
            ReasonCode::R006_BLINK_TOO_SLOW
        };
        if self.config.rearm_on_rejected_blink {
            Evaluation::commit(Transition::RearmBlink, reason)
        } else {
            Evaluation::hold(reason)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
