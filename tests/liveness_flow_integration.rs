//! Integration tests for the full challenge sequence
//!
//! start → LOOK_RIGHT → LOOK_LEFT → BLINK → COMPLETED, driven through the
//! controller with injected timestamps

use pretty_assertions::assert_eq;
use std::time::{Duration, Instant};

use vivacity::core::{FeedOutcome, SessionController};
use vivacity::types::{
    FaceMeasurement, FrameReport, LivenessConfig, LivenessStatus, LivenessStep, ReasonCode,
};

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn yaw(angle: f64) -> FaceMeasurement {
    FaceMeasurement::new(angle, 0.95, 0.95)
}

fn eyes(left: f64, right: f64) -> FaceMeasurement {
    FaceMeasurement::new(0.0, left, right)
}

/// Controller sitting in BLINK, entered at the returned instant
fn controller_in_blink(t0: Instant) -> (SessionController, Instant) {
    let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
    controller.start_at(t0).unwrap();
    let tag = controller.generation();
    controller.feed_at(&yaw(-20.0), tag, t0 + ms(1001));
    let t2 = t0 + ms(2002);
    controller.feed_at(&yaw(20.0), tag, t2);
    assert_eq!(controller.step(), LivenessStep::Blink);
    (controller, t2)
}

#[test]
fn test_full_sequence_completes() {
    let t0 = Instant::now();
    let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
    let mut rx = controller.subscribe();

    controller.start_at(t0).unwrap();
    let tag = controller.generation();

    let outcome = controller.feed_at(&yaw(-20.0), tag, t0 + ms(1001));
    assert_eq!(outcome.step_changed().map(|e| e.step), Some(LivenessStep::LookLeft));

    let t1 = t0 + ms(1001);
    let outcome = controller.feed_at(&yaw(20.0), tag, t1 + ms(1001));
    assert_eq!(outcome.step_changed().map(|e| e.step), Some(LivenessStep::Blink));
    assert!(!controller.session().blink_detected());

    let t2 = t1 + ms(1500);
    assert_eq!(controller.feed_at(&eyes(0.1, 0.1), tag, t2), FeedOutcome::BlinkLatched);
    let outcome = controller.feed_at(&eyes(0.9, 0.9), tag, t2 + ms(500));
    assert_eq!(outcome.step_changed().map(|e| e.step), Some(LivenessStep::Completed));
    assert_eq!(controller.status(), LivenessStatus::Completed);

    let steps: Vec<LivenessStep> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|event| event.step)
        .collect();
    assert_eq!(
        steps,
        vec![
            LivenessStep::LookRight,
            LivenessStep::LookLeft,
            LivenessStep::Blink,
            LivenessStep::Completed,
        ]
    );
}

#[test]
fn test_dwell_blocks_early_transitions() {
    let t0 = Instant::now();
    let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
    controller.start_at(t0).unwrap();
    let tag = controller.generation();

    // 30 fps of perfect head turns, all inside the dwell window
    for frame in 0..30u64 {
        let outcome = controller.feed_at(&yaw(-45.0), tag, t0 + ms(frame * 33));
        assert_eq!(outcome.reason(), ReasonCode::R003_DWELL_ACCUMULATING);
    }
    assert_eq!(controller.step(), LivenessStep::LookRight);
}

#[test]
fn test_skipped_frames_do_not_matter() {
    let t0 = Instant::now();
    let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
    controller.start_at(t0).unwrap();
    let tag = controller.generation();

    // Single frame after a long stall is enough
    let outcome = controller.feed_at(&yaw(-16.0), tag, t0 + ms(4000));
    assert_eq!(outcome.step_changed().map(|e| e.step), Some(LivenessStep::LookLeft));
}

#[test]
fn test_slow_blink_stays_in_blink() {
    let (mut controller, t2) = controller_in_blink(Instant::now());
    let tag = controller.generation();

    controller.feed_at(&eyes(0.1, 0.1), tag, t2);
    let outcome = controller.feed_at(&eyes(0.9, 0.9), tag, t2 + ms(1500));

    assert_eq!(outcome, FeedOutcome::BlinkRejected { reason: ReasonCode::R006_BLINK_TOO_SLOW });
    assert_eq!(controller.step(), LivenessStep::Blink);
    assert_eq!(controller.status(), LivenessStatus::InProgress);
}

#[test]
fn test_blink_after_rejection_can_still_complete() {
    let (mut controller, t2) = controller_in_blink(Instant::now());
    let tag = controller.generation();

    controller.feed_at(&eyes(0.1, 0.1), tag, t2);
    controller.feed_at(&eyes(0.9, 0.9), tag, t2 + ms(1500));

    // Fresh blink is measured from its own closed-eyes frame
    assert_eq!(controller.feed_at(&eyes(0.1, 0.1), tag, t2 + ms(3000)), FeedOutcome::BlinkLatched);
    let outcome = controller.feed_at(&eyes(0.9, 0.9), tag, t2 + ms(3300));
    assert_eq!(outcome.step_changed().map(|e| e.step), Some(LivenessStep::Completed));
}

#[test]
fn test_without_rearm_stale_latch_blocks_completion() {
    let t0 = Instant::now();
    let config = LivenessConfig { rearm_on_rejected_blink: false, ..Default::default() };
    let mut controller = SessionController::new_at(config, t0);
    controller.start_at(t0).unwrap();
    let tag = controller.generation();
    controller.feed_at(&yaw(-20.0), tag, t0 + ms(1000));
    controller.feed_at(&yaw(20.0), tag, t0 + ms(2000));

    let t2 = t0 + ms(2100);
    controller.feed_at(&eyes(0.1, 0.1), tag, t2);
    controller.feed_at(&eyes(0.9, 0.9), tag, t2 + ms(1500));

    // Old closed-eyes timestamp is kept, so a quick blink later is still "too slow"
    controller.feed_at(&eyes(0.1, 0.1), tag, t2 + ms(3000));
    let outcome = controller.feed_at(&eyes(0.9, 0.9), tag, t2 + ms(3300));
    assert_eq!(outcome.reason(), ReasonCode::R006_BLINK_TOO_SLOW);
    assert_eq!(controller.step(), LivenessStep::Blink);
}

#[test]
fn test_reset_in_blink_discards_late_frames() {
    let (mut controller, t2) = controller_in_blink(Instant::now());
    let old_tag = controller.generation();
    controller.feed_at(&eyes(0.1, 0.1), old_tag, t2);

    let event = controller.reset_at(t2 + ms(100));
    assert_eq!(event.step, LivenessStep::Waiting);
    assert_eq!(controller.status(), LivenessStatus::Pending);

    // Frame that was in flight when reset happened
    let outcome = controller.feed_at(&eyes(0.9, 0.9), old_tag, t2 + ms(400));
    assert_eq!(outcome, FeedOutcome::Stale);

    // Still stale after a new start
    controller.start_at(t2 + ms(500)).unwrap();
    let outcome = controller.feed_at(&yaw(-30.0), old_tag, t2 + ms(2000));
    assert_eq!(outcome, FeedOutcome::Stale);
    assert_eq!(controller.step(), LivenessStep::LookRight);
}

#[test]
fn test_failed_gate_is_idempotent() {
    let t0 = Instant::now();
    let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
    controller.start_at(t0).unwrap();
    let tag = controller.generation();

    let measurement = yaw(-10.0);
    for _ in 0..50 {
        controller.feed_at(&measurement, tag, t0 + ms(2500));
    }
    assert_eq!(controller.step(), LivenessStep::LookRight);
}

#[test]
fn test_no_face_frames_never_advance() {
    let t0 = Instant::now();
    let mut controller = SessionController::new_at(LivenessConfig::default(), t0);
    controller.start_at(t0).unwrap();
    let tag = controller.generation();

    for i in 0..10u64 {
        let outcome = controller.feed_frame_at(&FrameReport::default(), tag, t0 + ms(1000 + i * 100));
        assert_eq!(outcome, FeedOutcome::NoFace);
    }
    assert_eq!(controller.step(), LivenessStep::LookRight);
    assert_eq!(controller.diagnostics().face_count, 0);
}
