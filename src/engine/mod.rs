//! Queue execution engine
//!
//! [`RunController`] owns a run and its worker task. The worker drives an
//! [`Interpreter`] over the compiled queue once per top-level repetition.
//! Stopping is cooperative through a shared [`CancelToken`].

pub mod cancel;
pub mod controller;
pub mod interpreter;
pub mod pacing;
pub mod report;

pub use cancel::CancelToken;
pub use controller::{RunController, StartOutcome};
pub use interpreter::Interpreter;
pub use report::{RunReport, RunStats};
