//! Queue item model.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::action::Action;
use crate::error::{LooperError, Result};
use crate::trigger::Trigger;

/// Parameters of a repeatable block
#[derive(Debug, Clone)]
pub struct LoopSpec {
    /// Number of iterations, at least 1
    pub count: u32,
    /// Target time from the start of one iteration to the start of the next
    pub interval: Duration,
    /// Ends the loop early when met after an iteration
    pub trigger: Option<Trigger>,
}

/// One entry of a flat queue
#[derive(Clone)]
pub enum QueueItem {
    Action {
        label: String,
        operation: Arc<dyn Action>,
    },
    LoopStart(LoopSpec),
    ConditionalStart {
        trigger: Trigger,
    },
    LoopEnd,
}

impl QueueItem {
    pub fn action(label: impl Into<String>, operation: impl Action + 'static) -> Self {
        Self::shared_action(label, Arc::new(operation))
    }

    pub fn shared_action(label: impl Into<String>, operation: Arc<dyn Action>) -> Self {
        QueueItem::Action {
            label: label.into(),
            operation,
        }
    }

    /// Open a loop block. Fails when `count` is zero.
    pub fn loop_start(count: u32, interval: Duration, trigger: Option<Trigger>) -> Result<Self> {
        if count == 0 {
            return Err(LooperError::InvalidStep(
                "loop count must be at least 1".into(),
            ));
        }
        Ok(QueueItem::LoopStart(LoopSpec {
            count,
            interval,
            trigger,
        }))
    }

    /// Open a conditional block, run at most once when `trigger` is met
    pub fn conditional(trigger: Trigger) -> Self {
        QueueItem::ConditionalStart { trigger }
    }

    pub fn loop_end() -> Self {
        QueueItem::LoopEnd
    }

    /// Whether this item opens a block closed by a later `LoopEnd`
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            QueueItem::LoopStart(_) | QueueItem::ConditionalStart { .. }
        )
    }

    pub fn closes_block(&self) -> bool {
        matches!(self, QueueItem::LoopEnd)
    }
}

impl fmt::Debug for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueItem::Action { label, .. } => f.debug_struct("Action").field("label", label).finish(),
            QueueItem::LoopStart(spec) => f.debug_tuple("LoopStart").field(spec).finish(),
            QueueItem::ConditionalStart { trigger } => f
                .debug_struct("ConditionalStart")
                .field("trigger", trigger)
                .finish(),
            QueueItem::LoopEnd => f.write_str("LoopEnd"),
        }
    }
}

impl fmt::Display for QueueItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueItem::Action { label, .. } => write!(f, "- {}", label),
            QueueItem::LoopStart(spec) => {
                write!(
                    f,
                    "[ Start Loop x{}, Interval {}s ]",
                    spec.count,
                    spec.interval.as_secs_f64()
                )?;
                if let Some(trigger) = &spec.trigger {
                    write!(f, " Trigger: {}", trigger)?;
                }
                Ok(())
            }
            QueueItem::ConditionalStart { trigger } => write!(f, "If trigger: {}", trigger),
            QueueItem::LoopEnd => f.write_str("[ End Loop ]"),
        }
    }
}
