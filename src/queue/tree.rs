//! Compiled form of a queue
//!
//! Before a run the flat queue is validated and folded into a tree, so the
//! interpreter never rescans bracket markers while it repeats a body.

use std::fmt;
use std::sync::Arc;

use crate::action::Action;
use crate::error::Result;
use crate::trigger::Trigger;

use super::bracket::{match_block, validate_balance};
use super::item::{LoopSpec, QueueItem};

/// One node of a compiled queue
#[derive(Clone)]
pub enum Node {
    Action {
        label: String,
        operation: Arc<dyn Action>,
    },
    Loop {
        spec: LoopSpec,
        body: Vec<Node>,
    },
    Conditional {
        trigger: Trigger,
        body: Vec<Node>,
    },
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Action { label, .. } => f.debug_struct("Action").field("label", label).finish(),
            Node::Loop { spec, body } => f
                .debug_struct("Loop")
                .field("spec", spec)
                .field("body", body)
                .finish(),
            Node::Conditional { trigger, body } => f
                .debug_struct("Conditional")
                .field("trigger", trigger)
                .field("body", body)
                .finish(),
        }
    }
}

/// A validated queue ready to run
#[derive(Debug, Clone, Default)]
pub struct Program {
    nodes: Vec<Node>,
}

impl Program {
    /// Validate marker balance and build the tree in one pass.
    pub fn compile(items: &[QueueItem]) -> Result<Self> {
        validate_balance(items)?;
        Ok(Self {
            nodes: build(items),
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of action leaves, counting each once regardless of repeats
    pub fn action_count(&self) -> usize {
        fn count(nodes: &[Node]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    Node::Action { .. } => 1,
                    Node::Loop { body, .. } | Node::Conditional { body, .. } => count(body),
                })
                .sum()
        }
        count(&self.nodes)
    }
}

fn build(items: &[QueueItem]) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut index = 0;

    while index < items.len() {
        match &items[index] {
            QueueItem::Action { label, operation } => {
                nodes.push(Node::Action {
                    label: label.clone(),
                    operation: operation.clone(),
                });
                index += 1;
            }
            QueueItem::LoopStart(spec) => {
                let block = match_block(items, index);
                nodes.push(Node::Loop {
                    spec: spec.clone(),
                    body: build(block.body),
                });
                index = block.resume;
            }
            QueueItem::ConditionalStart { trigger } => {
                let block = match_block(items, index);
                nodes.push(Node::Conditional {
                    trigger: trigger.clone(),
                    body: build(block.body),
                });
                index = block.resume;
            }
            // only reachable for unvalidated input
            QueueItem::LoopEnd => index += 1,
        }
    }

    nodes
}
