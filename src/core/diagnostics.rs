//! Frame-rate counter and debug overlay state
//!
//! Independent of the state machine. Nothing here affects liveness decisions.

use std::time::Instant;

use crate::types::{DiagnosticsSnapshot, FaceMeasurement};
use crate::FPS_WINDOW_MS;

/// Frames counted over a rolling window, recomputed at each window boundary
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window_ms: u64,
    frames: u64,
    window_start: Instant,
    fps: u32,
}

impl FpsCounter {
    pub fn new(window_ms: u64, now: Instant) -> Self {
        Self {
            window_ms,
            frames: 0,
            window_start: now,
            fps: 0,
        }
    }

    /// Count one frame. Returns the new fps when a window closes.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        self.frames += 1;
        let elapsed_ms = now.saturating_duration_since(self.window_start).as_millis() as u64;
        if elapsed_ms < self.window_ms || elapsed_ms == 0 {
            return None;
        }

        let fps = (self.frames as f64 * 1000.0 / elapsed_ms as f64).round() as u32;
        self.fps = fps;
        self.frames = 0;
        self.window_start = now;
        Some(fps)
    }

    /// Last computed fps (0 until the first window closes)
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

/// Overlay state: fps plus the primary face of the latest frame
#[derive(Debug, Clone)]
pub struct Diagnostics {
    counter: FpsCounter,
    face_count: usize,
    primary: Option<FaceMeasurement>,
}

impl Diagnostics {
    pub fn new(window_ms: u64, now: Instant) -> Self {
        Self {
            counter: FpsCounter::new(window_ms, now),
            face_count: 0,
            primary: None,
        }
    }

    /// Record one delivered frame
    pub fn record(&mut self, faces: &[FaceMeasurement], now: Instant) -> Option<u32> {
        self.face_count = faces.len();
        self.primary = faces.first().cloned();
        self.counter.tick(now)
    }

    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            fps: self.counter.fps(),
            face_count: self.face_count,
            yaw_angle: self.primary.as_ref().map(|f| f.yaw_angle),
            left_eye_open: self.primary.as_ref().map(|f| f.left_eye_open_probability),
            right_eye_open: self.primary.as_ref().map(|f| f.right_eye_open_probability),
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new(FPS_WINDOW_MS, Instant::now())
    }
}
