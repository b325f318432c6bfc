//! Core modules for Vivacity

pub mod state_machine;
pub mod controller;
pub mod diagnostics;
pub mod replay;
pub mod api;

pub use state_machine::{LivenessStateMachine, Evaluation};
pub use controller::{SessionController, FeedOutcome};
pub use diagnostics::{Diagnostics, FpsCounter};
pub use replay::{replay, parse_trace_line, TraceEvent, ReplayReport};
pub use api::{create_router, run_server};
