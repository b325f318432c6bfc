//! Session controller: owns the one active session
//!
//! All mutation goes through `&mut self`, so callers sharing a controller
//! across tasks wrap it in a mutex (single writer). Step-changed events go
//! out on a broadcast channel; sending never waits on receivers.

use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::core::{Diagnostics, LivenessStateMachine};
use crate::error::{LivenessError, Result};
use crate::types::{
    DiagnosticsSnapshot, FaceMeasurement, FrameReport, LivenessConfig, LivenessSession,
    LivenessStatus, LivenessStep, ReasonCode, SessionSnapshot, StepChanged, Transition,
};
use crate::EVENT_CHANNEL_CAPACITY;

/// What a fed frame did to the session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FeedOutcome {
    /// Tagged with a superseded generation, discarded
    Stale,
    /// No session in progress
    Idle,
    /// Frame had no face
    NoFace,
    /// Detector failed on this frame
    DetectorFailure { message: String },
    /// Evaluated, nothing committed
    Unchanged { reason: ReasonCode },
    /// Eyes-closed observation latched
    BlinkLatched,
    /// Reopen outside the valid window, latch cleared
    BlinkRejected { reason: ReasonCode },
    /// Step advanced
    Advanced { event: StepChanged },
}

impl FeedOutcome {
    pub fn reason(&self) -> ReasonCode {
        match self {
            FeedOutcome::Stale => ReasonCode::R007_STALE_GENERATION,
            FeedOutcome::Idle => ReasonCode::R007_SESSION_IDLE,
            FeedOutcome::NoFace => ReasonCode::R007_NO_FACE,
            FeedOutcome::DetectorFailure { .. } => ReasonCode::R007_DETECTOR_FAILURE,
            FeedOutcome::Unchanged { reason } => *reason,
            FeedOutcome::BlinkLatched => ReasonCode::R006_BLINK_LATCHED,
            FeedOutcome::BlinkRejected { reason } => *reason,
            FeedOutcome::Advanced { event } => event.reason,
        }
    }

    /// The committed step change, if this frame produced one
    pub fn step_changed(&self) -> Option<&StepChanged> {
        match self {
            FeedOutcome::Advanced { event } => Some(event),
            _ => None,
        }
    }
}

/// Owns the session, the evaluator and the diagnostics
#[derive(Debug)]
pub struct SessionController {
    session: LivenessSession,
    machine: LivenessStateMachine,
    diagnostics: Diagnostics,
    events: broadcast::Sender<StepChanged>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(LivenessConfig::default())
    }
}

impl SessionController {
    pub fn new(config: LivenessConfig) -> Self {
        Self::new_at(config, Instant::now())
    }

    /// Create with an explicit clock origin
    pub fn new_at(config: LivenessConfig, now: Instant) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session: LivenessSession::new(now),
            diagnostics: Diagnostics::new(config.fps_window_ms, now),
            machine: LivenessStateMachine::new(config),
            events,
        }
    }

    /// Receive step-changed events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StepChanged> {
        self.events.subscribe()
    }

    /// Tag a frame source must capture before running detection
    pub fn generation(&self) -> u64 {
        self.session.generation()
    }

    pub fn step(&self) -> LivenessStep {
        self.session.step()
    }

    pub fn status(&self) -> LivenessStatus {
        self.session.status()
    }

    pub fn session(&self) -> &LivenessSession {
        &self.session
    }

    pub fn config(&self) -> &LivenessConfig {
        self.machine.config()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> SessionSnapshot {
        self.session.snapshot(now)
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    /// Begin the challenge sequence
    pub fn start(&mut self) -> Result<StepChanged> {
        self.start_at(Instant::now())
    }

    /// Legal from PENDING or COMPLETED only
    pub fn start_at(&mut self, now: Instant) -> Result<StepChanged> {
        if self.session.status() == LivenessStatus::InProgress {
            return Err(LivenessError::AlreadyInProgress { step: self.session.step() });
        }
        self.session.begin(now);
        info!(generation = self.session.generation(), "Liveness test started");
        Ok(self.notify(ReasonCode::R001_SESSION_STARTED))
    }

    /// Discard the session from any state; in-flight frames become stale
    pub fn reset(&mut self) -> StepChanged {
        self.reset_at(Instant::now())
    }

    pub fn reset_at(&mut self, now: Instant) -> StepChanged {
        let previous = self.session.step();
        self.session.clear(now);
        info!(
            generation = self.session.generation(),
            previous = %previous,
            "Liveness test reset"
        );
        self.notify(ReasonCode::R001_SESSION_RESET)
    }

    /// Feed the primary face of a frame, tagged with the generation
    /// captured when the frame was taken
    pub fn feed(&mut self, measurement: &FaceMeasurement, generation: u64) -> FeedOutcome {
        self.feed_at(measurement, generation, Instant::now())
    }

    pub fn feed_at(
        &mut self,
        measurement: &FaceMeasurement,
        generation: u64,
        now: Instant,
    ) -> FeedOutcome {
        if generation != self.session.generation() {
            debug!(
                tag = generation,
                current = self.session.generation(),
                "Discarding stale measurement"
            );
            return FeedOutcome::Stale;
        }
        if self.session.status() != LivenessStatus::InProgress {
            return FeedOutcome::Idle;
        }

        let evaluation = self.machine.evaluate(&self.session, measurement, now);
        let Some(transition) = evaluation.transition else {
            debug!(step = %self.session.step(), reason = evaluation.reason.code(), "No transition");
            return FeedOutcome::Unchanged { reason: evaluation.reason };
        };

        self.session.apply(transition, now);
        match transition {
            Transition::Advance(step) => {
                info!(generation, step = %step, reason = evaluation.reason.code(), "Step advanced");
                FeedOutcome::Advanced { event: self.notify(evaluation.reason) }
            }
            Transition::LatchBlink => {
                debug!(generation, "Blink latched");
                FeedOutcome::BlinkLatched
            }
            Transition::RearmBlink => {
                warn!(generation, reason = evaluation.reason.code(), "Blink rejected");
                FeedOutcome::BlinkRejected { reason: evaluation.reason }
            }
        }
    }

    /// Feed a whole detector result: diagnostics see every frame, the
    /// state machine sees only the first face
    pub fn feed_frame(&mut self, report: &FrameReport, generation: u64) -> FeedOutcome {
        self.feed_frame_at(report, generation, Instant::now())
    }

    pub fn feed_frame_at(
        &mut self,
        report: &FrameReport,
        generation: u64,
        now: Instant,
    ) -> FeedOutcome {
        let faces = match report.as_result() {
            Ok(faces) => faces,
            Err(err) => {
                warn!(generation, "{}", err);
                self.diagnostics.record(&[], now);
                return FeedOutcome::DetectorFailure { message: err.0 };
            }
        };

        if let Some(fps) = self.diagnostics.record(faces, now) {
            debug!(fps, "Frame rate window closed");
        }

        match faces.first() {
            Some(primary) => self.feed_at(primary, generation, now),
            None => {
                debug!(generation, "No face in frame");
                FeedOutcome::NoFace
            }
        }
    }

    /// Build the event for the current step and broadcast it without waiting
    fn notify(&self, reason: ReasonCode) -> StepChanged {
        let event = StepChanged::new(self.session.generation(), self.session.step(), reason);
        // No receivers is fine: notification is fire-and-forget
        let _ = self.events.send(event.clone());
        event
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    fn started(t0: Instant) -> SessionController {
        let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
        controller.start_at(t0).unwrap();
        controller
    }

    #[test]
    fn test_initial_state_is_pending() {
        let controller = SessionController::default();
        assert_eq!(controller.step(), LivenessStep::Waiting);
        assert_eq!(controller.status(), LivenessStatus::Pending);
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn test_start_enters_look_right() {
        let t0 = Instant::now();
        let controller = started(t0);
        assert_eq!(controller.step(), LivenessStep::LookRight);
        assert_eq!(controller.status(), LivenessStatus::InProgress);
        assert_eq!(controller.generation(), 1);
    }

    #[test]
    fn test_start_rejected_while_in_progress() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let err = controller.start_at(t0 + ms(10)).unwrap_err();
        assert!(matches!(err, LivenessError::AlreadyInProgress { step: LivenessStep::LookRight }));
        assert_eq!(controller.generation(), 1);
    }

    #[test]
    fn test_feed_ignored_while_pending() {
        let t0 = Instant::now();
        let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
        let tag = controller.generation();
        let outcome = controller.feed_at(&FaceMeasurement::new(-30.0, 1.0, 1.0), tag, t0 + ms(2000));
        assert_eq!(outcome, FeedOutcome::Idle);
        assert_eq!(controller.step(), LivenessStep::Waiting);
    }

    #[test]
    fn test_stale_generation_discarded() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let old_tag = controller.generation();

        controller.reset_at(t0 + ms(100));
        controller.start_at(t0 + ms(200)).unwrap();

        let outcome = controller.feed_at(&FaceMeasurement::new(-30.0, 1.0, 1.0), old_tag, t0 + ms(5000));
        assert_eq!(outcome, FeedOutcome::Stale);
        assert_eq!(controller.step(), LivenessStep::LookRight);
    }

    #[test]
    fn test_advance_broadcasts_event() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let mut rx = controller.subscribe();
        let tag = controller.generation();

        let outcome = controller.feed_at(&FaceMeasurement::new(-20.0, 1.0, 1.0), tag, t0 + ms(1001));
        let event = outcome.step_changed().cloned().unwrap();
        assert_eq!(event.step, LivenessStep::LookLeft);

        let received = rx.try_recv().unwrap();
        assert_eq!(received.step, LivenessStep::LookLeft);
        assert_eq!(received.generation, tag);
    }

    #[test]
    fn test_notify_without_receivers_does_not_fail() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let event = controller.reset_at(t0 + ms(1));
        assert_eq!(event.step, LivenessStep::Waiting);
        assert_eq!(event.status, LivenessStatus::Pending);
    }

    #[test]
    fn test_frame_without_face_is_noop() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let tag = controller.generation();
        let outcome = controller.feed_frame_at(&FrameReport::default(), tag, t0 + ms(1500));
        assert_eq!(outcome, FeedOutcome::NoFace);
        assert_eq!(controller.step(), LivenessStep::LookRight);
    }

    #[test]
    fn test_detector_failure_is_not_fatal() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let tag = controller.generation();

        let outcome = controller.feed_frame_at(&FrameReport::failed("timeout"), tag, t0 + ms(1100));
        assert_eq!(outcome.reason(), ReasonCode::R007_DETECTOR_FAILURE);

        let next = FrameReport::with_faces(vec![FaceMeasurement::new(-20.0, 1.0, 1.0)]);
        let outcome = controller.feed_frame_at(&next, tag, t0 + ms(1200));
        assert_eq!(outcome.step_changed().map(|e| e.step), Some(LivenessStep::LookLeft));
    }

    #[test]
    fn test_only_first_face_counts() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let tag = controller.generation();

        let report = FrameReport::with_faces(vec![
            FaceMeasurement::new(0.0, 1.0, 1.0),
            FaceMeasurement::new(-40.0, 1.0, 1.0),
        ]);
        let outcome = controller.feed_frame_at(&report, tag, t0 + ms(1500));
        assert_eq!(outcome.reason(), ReasonCode::R004_YAW_NOT_RIGHT);
        assert_eq!(controller.diagnostics().face_count, 2);
    }

    #[test]
    fn test_restart_after_completed() {
        let t0 = Instant::now();
        let mut controller = started(t0);
        let tag = controller.generation();

        controller.feed_at(&FaceMeasurement::new(-20.0, 1.0, 1.0), tag, t0 + ms(1000));
        controller.feed_at(&FaceMeasurement::new(20.0, 1.0, 1.0), tag, t0 + ms(2000));
        controller.feed_at(&FaceMeasurement::new(0.0, 0.1, 0.1), tag, t0 + ms(2100));
        controller.feed_at(&FaceMeasurement::new(0.0, 0.9, 0.9), tag, t0 + ms(2500));
        assert_eq!(controller.status(), LivenessStatus::Completed);

        // Completed is terminal for frames
        let outcome = controller.feed_at(&FaceMeasurement::new(-20.0, 1.0, 1.0), tag, t0 + ms(9000));
        assert_eq!(outcome, FeedOutcome::Idle);

        controller.start_at(t0 + ms(9100)).unwrap();
        assert_eq!(controller.step(), LivenessStep::LookRight);
        assert_eq!(controller.generation(), tag + 1);
    }
}
