//! Built-in actions: waiting, logging, shell commands and instrument calls.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LooperError, Result};
use crate::shell;

use super::Action;
use super::instrument::Instrument;

/// Sleep for a fixed time
#[derive(Debug, Clone, Copy)]
pub struct Wait(pub Duration);

#[async_trait]
impl Action for Wait {
    async fn run(&self) -> Result<()> {
        tokio::time::sleep(self.0).await;
        Ok(())
    }
}

/// Print a message to the console
#[derive(Debug, Clone)]
pub struct Log(pub String);

#[async_trait]
impl Action for Log {
    async fn run(&self) -> Result<()> {
        println!("{}", self.0);
        Ok(())
    }
}

/// Run a shell command; a non-zero exit fails the action
#[derive(Debug, Clone)]
pub struct Command {
    command: String,
}

impl Command {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl Action for Command {
    async fn run(&self) -> Result<()> {
        let stdout = shell::capture(&self.command)
            .await
            .map_err(LooperError::Action)?;
        if !stdout.is_empty() {
            println!("{}", stdout);
        }
        Ok(())
    }
}

/// Run a named protocol on the instrument
pub struct Protocol {
    name: String,
    instrument: Arc<dyn Instrument>,
}

impl Protocol {
    pub fn new(name: impl Into<String>, instrument: Arc<dyn Instrument>) -> Self {
        Self {
            name: name.into(),
            instrument,
        }
    }
}

#[async_trait]
impl Action for Protocol {
    async fn run(&self) -> Result<()> {
        self.instrument.run_protocol(&self.name).await
    }
}

/// Print the instrument's protocol progress
pub struct Progress {
    instrument: Arc<dyn Instrument>,
}

impl Progress {
    pub fn new(instrument: Arc<dyn Instrument>) -> Self {
        Self { instrument }
    }
}

#[async_trait]
impl Action for Progress {
    async fn run(&self) -> Result<()> {
        let progress = self.instrument.progress().await?;
        println!("{}", progress);
        Ok(())
    }
}
