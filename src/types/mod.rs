//! Core types for Vivacity

mod step;
mod measurement;
mod output;
mod reason;
mod session;
mod config;
mod diagnostics;

pub use step::{LivenessStep, LivenessStatus};
pub use measurement::{FaceMeasurement, BoundingBox, FrameReport};
pub use output::StepChanged;
pub use reason::ReasonCode;
pub use session::{LivenessSession, SessionSnapshot, Transition};
pub use config::LivenessConfig;
pub use diagnostics::DiagnosticsSnapshot;
