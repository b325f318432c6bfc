//! Deterministic replay of recorded measurement traces
//!
//! Trace format: JSON lines, one event per line.
//!   {"type":"start","offset_ms":0}
//!   {"type":"frame","offset_ms":1100,"faces":[{"yaw_angle":-22.0,...}]}
//!   {"type":"frame","offset_ms":1133,"error":"detector timeout"}
//!   {"type":"reset","offset_ms":4000}
//! Blank lines and `#` comments are skipped. Offsets are milliseconds from
//! the start of the trace and must not decrease.

use std::io::BufRead;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{FeedOutcome, SessionController};
use crate::error::{LivenessError, Result};
use crate::types::{
    DiagnosticsSnapshot, FaceMeasurement, FrameReport, LivenessConfig, SessionSnapshot,
    StepChanged,
};

/// One recorded event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    Start {
        offset_ms: u64,
    },
    Reset {
        offset_ms: u64,
    },
    Frame {
        offset_ms: u64,
        #[serde(default)]
        faces: Vec<FaceMeasurement>,
        #[serde(default)]
        error: Option<String>,
        /// Explicit tag, for frames that were in flight across a reset.
        /// Defaults to the generation current at `offset_ms`.
        #[serde(default)]
        generation: Option<u64>,
    },
}

impl TraceEvent {
    pub fn offset_ms(&self) -> u64 {
        match self {
            TraceEvent::Start { offset_ms }
            | TraceEvent::Reset { offset_ms }
            | TraceEvent::Frame { offset_ms, .. } => *offset_ms,
        }
    }
}

/// Summary of a replayed trace
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Every step change, including start/reset
    pub events: Vec<StepChanged>,
    pub frames: usize,
    pub stale_frames: usize,
    pub detector_failures: usize,
    /// start commands refused because a test was already running
    pub rejected_commands: usize,
    pub final_snapshot: SessionSnapshot,
    pub diagnostics: DiagnosticsSnapshot,
}

impl ReplayReport {
    pub fn passed(&self) -> bool {
        self.final_snapshot.status == crate::types::LivenessStatus::Completed
    }
}

/// Parse one trace line; `None` for blanks and comments
pub fn parse_trace_line(line_no: usize, line: &str) -> Result<Option<TraceEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|e| LivenessError::InvalidTrace { line: line_no, message: e.to_string() })
}

/// Replay a trace against a fresh controller
pub fn replay<R: BufRead>(reader: R, config: LivenessConfig) -> Result<ReplayReport> {
    let base = Instant::now();
    let mut controller = SessionController::new_at(config, base);

    let mut events = Vec::new();
    let mut frames = 0;
    let mut stale_frames = 0;
    let mut detector_failures = 0;
    let mut rejected_commands = 0;
    let mut last_offset = 0;
    let mut now = base;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line?;
        let Some(event) = parse_trace_line(line_no, &line)? else {
            continue;
        };

        let offset = event.offset_ms();
        if offset < last_offset {
            return Err(LivenessError::InvalidTrace {
                line: line_no,
                message: format!("offset {} ms precedes previous offset {} ms", offset, last_offset),
            });
        }
        last_offset = offset;
        now = base + Duration::from_millis(offset);

        match event {
            TraceEvent::Start { .. } => match controller.start_at(now) {
                Ok(changed) => events.push(changed),
                Err(err) => {
                    warn!(line = line_no, "{}", err);
                    rejected_commands += 1;
                }
            },
            TraceEvent::Reset { .. } => events.push(controller.reset_at(now)),
            TraceEvent::Frame { faces, error, generation, .. } => {
                frames += 1;
                let tag = generation.unwrap_or_else(|| controller.generation());
                let report = FrameReport { faces, error };
                match controller.feed_frame_at(&report, tag, now) {
                    FeedOutcome::Advanced { event } => events.push(event),
                    FeedOutcome::Stale => stale_frames += 1,
                    FeedOutcome::DetectorFailure { .. } => detector_failures += 1,
                    _ => {}
                }
            }
        }
    }

    let report = ReplayReport {
        events,
        frames,
        stale_frames,
        detector_failures,
        rejected_commands,
        final_snapshot: controller.snapshot_at(now),
        diagnostics: controller.diagnostics(),
    };
    info!(
        frames = report.frames,
        step = %report.final_snapshot.step,
        "Replay finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LivenessStep;

    #[test]
    fn test_skips_blank_and_comment_lines() {
        assert_eq!(parse_trace_line(1, "").unwrap(), None);
        assert_eq!(parse_trace_line(2, "   # recorded on device").unwrap(), None);
    }

    #[test]
    fn test_parses_frame_defaults() {
        let event = parse_trace_line(1, r#"{"type":"frame","offset_ms":40}"#)
            .unwrap()
            .unwrap();
        assert_eq!(
            event,
            TraceEvent::Frame { offset_ms: 40, faces: vec![], error: None, generation: None }
        );
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let err = parse_trace_line(7, r#"{"type":"wink"}"#).unwrap_err();
        assert!(matches!(err, LivenessError::InvalidTrace { line: 7, .. }));
    }

    #[test]
    fn test_decreasing_offset_rejected() {
        let trace = "{\"type\":\"start\",\"offset_ms\":500}\n{\"type\":\"reset\",\"offset_ms\":100}\n";
        let err = replay(trace.as_bytes(), LivenessConfig::default()).unwrap_err();
        assert!(matches!(err, LivenessError::InvalidTrace { line: 2, .. }));
    }

    #[test]
    fn test_double_start_counted_as_rejected() {
        let trace = "{\"type\":\"start\",\"offset_ms\":0}\n{\"type\":\"start\",\"offset_ms\":10}\n";
        let report = replay(trace.as_bytes(), LivenessConfig::default()).unwrap();
        assert_eq!(report.rejected_commands, 1);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.final_snapshot.step, LivenessStep::LookRight);
    }
}
