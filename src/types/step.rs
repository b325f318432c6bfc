//! Liveness step and status definitions

use serde::{Deserialize, Serialize};

/// The challenge sequence. Strictly forward except on explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LivenessStep {
    /// No session running, waiting for start()
    Waiting,
    /// Turn head right (yaw < -threshold)
    LookRight,
    /// Turn head left (yaw > threshold)
    LookLeft,
    /// Close then open both eyes
    Blink,
    /// All challenges passed
    Completed,
}

impl LivenessStep {
    /// Next step in the fixed sequence. `Waiting` and `Completed` have none:
    /// leaving them requires an explicit command.
    pub fn next(&self) -> Option<LivenessStep> {
        match self {
            LivenessStep::Waiting => None,
            LivenessStep::LookRight => Some(LivenessStep::LookLeft),
            LivenessStep::LookLeft => Some(LivenessStep::Blink),
            LivenessStep::Blink => Some(LivenessStep::Completed),
            LivenessStep::Completed => None,
        }
    }

    /// Status implied by this step
    pub fn status(&self) -> LivenessStatus {
        match self {
            LivenessStep::Waiting => LivenessStatus::Pending,
            LivenessStep::LookRight | LivenessStep::LookLeft | LivenessStep::Blink => {
                LivenessStatus::InProgress
            }
            LivenessStep::Completed => LivenessStatus::Completed,
        }
    }

    /// Instruction shown to the user for this step
    pub fn instruction(&self) -> &'static str {
        match self {
            LivenessStep::Waiting => "Press start to begin",
            LivenessStep::LookRight => "Look to the RIGHT",
            LivenessStep::LookLeft => "Look to the LEFT",
            LivenessStep::Blink => "BLINK your eyes",
            LivenessStep::Completed => "Test completed!",
        }
    }

    /// Get emoji for step
    pub fn emoji(&self) -> &'static str {
        match self {
            LivenessStep::Waiting => "⏳",
            LivenessStep::LookRight => "👉",
            LivenessStep::LookLeft => "👈",
            LivenessStep::Blink => "😑",
            LivenessStep::Completed => "✅",
        }
    }
}

impl std::fmt::Display for LivenessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LivenessStep::Waiting => "WAITING",
            LivenessStep::LookRight => "LOOK_RIGHT",
            LivenessStep::LookLeft => "LOOK_LEFT",
            LivenessStep::Blink => "BLINK",
            LivenessStep::Completed => "COMPLETED",
        };
        write!(f, "{}", name)
    }
}

/// Coarse session status, derived from the step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LivenessStatus {
    Pending,
    InProgress,
    Completed,
}

impl LivenessStatus {
    /// Get ANSI color code for terminal display
    pub fn color_code(&self) -> &'static str {
        match self {
            LivenessStatus::Pending => "\x1b[33m",    // Orange/Yellow
            LivenessStatus::InProgress => "\x1b[34m", // Blue
            LivenessStatus::Completed => "\x1b[32m",  // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }

    /// Indicator color for graphical front-ends
    pub fn color_hex(&self) -> &'static str {
        match self {
            LivenessStatus::Pending => "#FFA500",
            LivenessStatus::InProgress => "#007AFF",
            LivenessStatus::Completed => "#34C759",
        }
    }
}

impl std::fmt::Display for LivenessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LivenessStatus::Pending => "PENDING",
            LivenessStatus::InProgress => "IN_PROGRESS",
            LivenessStatus::Completed => "COMPLETED",
        };
        write!(f, "{}", name)
    }
}
