//! Instrument collaborator contract
//!
//! The engine never talks to hardware itself. Protocol and progress actions
//! go through an [`Instrument`], and stopping a run asks it to halt whatever
//! physical action is in progress.

use async_trait::async_trait;

use crate::error::{LooperError, Result};
use crate::shell;

/// Remote-controlled instrument
#[async_trait]
pub trait Instrument: Send + Sync {
    /// Run the named protocol to completion
    async fn run_protocol(&self, name: &str) -> Result<()>;

    /// Report progress of the current protocol
    async fn progress(&self) -> Result<String>;

    /// Halt any in-progress acquisition
    async fn halt(&self) -> Result<()>;
}

/// Instrument used when none is configured.
///
/// Protocol and progress requests fail; halting is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullInstrument;

#[async_trait]
impl Instrument for NullInstrument {
    async fn run_protocol(&self, name: &str) -> Result<()> {
        Err(LooperError::Instrument(format!(
            "no instrument configured to run protocol '{}'",
            name
        )))
    }

    async fn progress(&self) -> Result<String> {
        Err(LooperError::Instrument("no instrument configured".into()))
    }

    async fn halt(&self) -> Result<()> {
        Ok(())
    }
}

/// Instrument driven through shell command templates.
///
/// `{protocol}` in the protocol command is replaced by the protocol name.
#[derive(Debug, Clone, Default)]
pub struct CommandInstrument {
    protocol_command: Option<String>,
    progress_command: Option<String>,
    stop_command: Option<String>,
}

impl CommandInstrument {
    pub fn new(
        protocol_command: Option<String>,
        progress_command: Option<String>,
        stop_command: Option<String>,
    ) -> Self {
        Self {
            protocol_command,
            progress_command,
            stop_command,
        }
    }

    fn required<'a>(command: &'a Option<String>, what: &str) -> Result<&'a str> {
        command
            .as_deref()
            .ok_or_else(|| LooperError::Instrument(format!("no {} command configured", what)))
    }
}

#[async_trait]
impl Instrument for CommandInstrument {
    async fn run_protocol(&self, name: &str) -> Result<()> {
        let template = Self::required(&self.protocol_command, "protocol")?;
        let command = template.replace("{protocol}", name);
        shell::capture(&command)
            .await
            .map(|_| ())
            .map_err(LooperError::Instrument)
    }

    async fn progress(&self) -> Result<String> {
        let command = Self::required(&self.progress_command, "progress")?;
        shell::capture(command).await.map_err(LooperError::Instrument)
    }

    async fn halt(&self) -> Result<()> {
        match &self.stop_command {
            Some(command) => shell::capture(command)
                .await
                .map(|_| ())
                .map_err(LooperError::Instrument),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_null_instrument() {
        let instrument = NullInstrument;
        assert!(instrument.run_protocol("Snap").await.is_err());
        assert!(instrument.progress().await.is_err());
        assert!(instrument.halt().await.is_ok());
    }

    #[tokio::test]
    async fn test_command_instrument_protocol_placeholder() {
        let temp = TempDir::new().unwrap();
        let marker = temp.path().join("protocol.txt");
        let instrument = CommandInstrument::new(
            Some(format!("echo {{protocol}} > {}", marker.display())),
            None,
            None,
        );

        instrument.run_protocol("TimeLapse").await.unwrap();
        let written = std::fs::read_to_string(&marker).unwrap();
        assert_eq!(written.trim(), "TimeLapse");
    }

    #[tokio::test]
    async fn test_command_instrument_progress() {
        let instrument = CommandInstrument::new(None, Some("echo 0.2".into()), None);
        assert_eq!(instrument.progress().await.unwrap(), "0.2");
    }

    #[tokio::test]
    async fn test_command_instrument_missing_commands() {
        let instrument = CommandInstrument::default();
        assert!(instrument.run_protocol("Snap").await.is_err());
        assert!(instrument.progress().await.is_err());
        assert!(instrument.halt().await.is_ok());
    }

    #[tokio::test]
    async fn test_command_instrument_halt_failure() {
        let instrument = CommandInstrument::new(None, None, Some("exit 2".into()));
        assert!(matches!(
            instrument.halt().await,
            Err(LooperError::Instrument(_))
        ));
    }
}
