//! Queue definition files
//!
//! A queue can be written down as YAML (or JSON) and built into a [`Queue`]
//! against a trigger registry and an instrument:
//!
//! ```yaml
//! repeats: 2
//! interval_secs: 600
//! steps:
//!   - protocol: TimeLapse
//!   - loop: { count: 5, interval_secs: 60, trigger: { function: max, condition: ">", threshold: 200 } }
//!   - progress
//!   - if: { function: max, condition: "<", threshold: 50 }
//!   - command: { label: Refocus, run: ./refocus.sh }
//!   - end
//!   - end
//!   - wait: 30
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::action::{Command, Instrument, Log, Progress, Protocol, Wait};
use crate::error::{LooperError, Result};
use crate::trigger::{Comparison, Trigger, TriggerRegistry};

use super::item::QueueItem;
use super::list::Queue;

/// Trigger reference inside a queue file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerStep {
    pub function: String,
    pub condition: Comparison,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopStep {
    pub count: u32,
    #[serde(default)]
    pub interval_secs: f64,
    #[serde(default)]
    pub trigger: Option<TriggerStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandStep {
    #[serde(default)]
    pub label: Option<String>,
    pub run: String,
}

/// One step of a queue file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Wait(f64),
    Log(String),
    Command(CommandStep),
    Protocol(String),
    Progress,
    Loop(LoopStep),
    If(TriggerStep),
    End,
}

/// Top-level queue file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueFile {
    #[serde(default)]
    pub repeats: Option<u32>,
    #[serde(default)]
    pub interval_secs: Option<f64>,
    /// Steps are written as single-key maps (`- wait: 30`) in YAML too
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

impl QueueFile {
    /// Load a queue file; `.json` files are read as JSON, anything else as YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Top-level interval, if the file sets one
    pub fn interval(&self) -> Result<Option<Duration>> {
        self.interval_secs
            .map(|secs| seconds(secs, "interval_secs"))
            .transpose()
    }

    /// Resolve every step into a queue item.
    ///
    /// Trigger names are looked up in `registry` here, so an unknown name
    /// fails the build rather than the run. Marker balance is not checked;
    /// that happens when the queue is compiled.
    pub fn build(&self, registry: &TriggerRegistry, instrument: Arc<dyn Instrument>) -> Result<Queue> {
        let mut queue = Queue::new();
        for (index, step) in self.steps.iter().enumerate() {
            let item = build_step(step, registry, &instrument).map_err(|e| match e {
                LooperError::InvalidStep(msg) => {
                    LooperError::QueueFile(format!("step {}: {}", index + 1, msg))
                }
                other => other,
            })?;
            queue.push(item);
        }
        Ok(queue)
    }
}

fn build_step(
    step: &Step,
    registry: &TriggerRegistry,
    instrument: &Arc<dyn Instrument>,
) -> Result<QueueItem> {
    let item = match step {
        Step::Wait(secs) => {
            let duration = seconds(*secs, "wait")?;
            QueueItem::action(format!("Waiting for {} s", secs), Wait(duration))
        }
        Step::Log(message) => QueueItem::action(format!("Log: {}", message), Log(message.clone())),
        Step::Command(cmd) => {
            let label = cmd
                .label
                .clone()
                .unwrap_or_else(|| format!("Command: {}", cmd.run));
            QueueItem::action(label, Command::new(cmd.run.clone()))
        }
        Step::Protocol(name) => QueueItem::action(
            format!("Protocol: {}", name),
            Protocol::new(name.clone(), instrument.clone()),
        ),
        Step::Progress => QueueItem::action("Get progress", Progress::new(instrument.clone())),
        Step::Loop(spec) => {
            let trigger = spec
                .trigger
                .as_ref()
                .map(|t| resolve(t, registry))
                .transpose()?;
            QueueItem::loop_start(spec.count, seconds(spec.interval_secs, "interval_secs")?, trigger)?
        }
        Step::If(trigger) => QueueItem::conditional(resolve(trigger, registry)?),
        Step::End => QueueItem::loop_end(),
    };
    Ok(item)
}

fn resolve(step: &TriggerStep, registry: &TriggerRegistry) -> Result<Trigger> {
    registry.resolve(&step.function, step.condition, step.threshold)
}

fn seconds(secs: f64, field: &str) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(LooperError::InvalidStep(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| LooperError::InvalidStep(format!("{} of {} seconds: {}", field, secs, e)))
}
