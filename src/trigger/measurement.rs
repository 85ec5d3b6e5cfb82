//! Measurement capabilities used by triggers.

use async_trait::async_trait;

use crate::error::{LooperError, Result};
use crate::shell;

/// A zero-argument capability returning one numeric reading
#[async_trait]
pub trait Measurement: Send + Sync {
    async fn measure(&self) -> Result<f64>;
}

/// Measurement backed by a plain closure
pub struct FnMeasurement<F> {
    func: F,
}

impl<F> FnMeasurement<F>
where
    F: Fn() -> Result<f64> + Send + Sync,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> Measurement for FnMeasurement<F>
where
    F: Fn() -> Result<f64> + Send + Sync,
{
    async fn measure(&self) -> Result<f64> {
        (self.func)()
    }
}

/// Measurement that runs a shell command and reads a number from stdout.
///
/// Typically a small script that loads the last acquired image and prints
/// its maximum or a percentile.
#[derive(Debug, Clone)]
pub struct CommandMeasurement {
    command: String,
}

impl CommandMeasurement {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Measurement for CommandMeasurement {
    async fn measure(&self) -> Result<f64> {
        let stdout = shell::capture(&self.command)
            .await
            .map_err(LooperError::Measurement)?;
        stdout.parse::<f64>().map_err(|e| {
            LooperError::Measurement(format!(
                "'{}' printed '{}', not a number: {}",
                self.command, stdout, e
            ))
        })
    }
}
