//! queuelooper - a queue execution engine for timed instrument runs
//!
//! Queues are flat lists of actions with loop and conditional markers. They
//! are compiled into a tree, then executed with interval-compensated repeats,
//! measurement-driven triggers and cooperative cancellation.

pub mod action;
pub mod engine;
pub mod error;
pub mod queue;
pub mod shell;
pub mod trigger;

pub use error::{LooperError, Result};
