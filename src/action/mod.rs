//! Action operations executed by queue items
//!
//! An action is a zero-argument side effect that either completes or fails.
//! Failures are reported as errors so the interpreter can log them and move
//! on to the next item.

pub mod builtin;
pub mod instrument;

use async_trait::async_trait;

use crate::error::Result;

pub use builtin::{Command, Log, Progress, Protocol, Wait};
pub use instrument::{CommandInstrument, Instrument, NullInstrument};

/// A side-effecting step of the queue
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Action backed by a plain closure
pub struct FnAction<F> {
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn() -> Result<()> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Action for FnAction<F>
where
    F: Fn() -> Result<()> + Send + Sync,
{
    async fn run(&self) -> Result<()> {
        (self.func)()
    }
}
