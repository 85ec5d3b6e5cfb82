//! The editable queue.

use std::fmt;

use crate::error::Result;

use super::item::QueueItem;
use super::tree::Program;

/// Ordered list of queue items; insertion order is execution order
#[derive(Debug, Clone, Default)]
pub struct Queue {
    items: Vec<QueueItem>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item to the end of the queue
    pub fn push(&mut self, item: QueueItem) {
        self.items.push(item);
    }

    /// Builder-style append
    pub fn with(mut self, item: QueueItem) -> Self {
        self.push(item);
        self
    }

    pub fn remove_last(&mut self) -> Option<QueueItem> {
        self.items.pop()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of blocks opened and not yet closed at the end of the queue
    pub fn open_blocks(&self) -> usize {
        let mut depth = 0usize;
        for item in &self.items {
            if item.opens_block() {
                depth += 1;
            } else if item.closes_block() {
                depth = depth.saturating_sub(1);
            }
        }
        depth
    }

    /// Validate and compile for execution
    pub fn compile(&self) -> Result<Program> {
        Program::compile(&self.items)
    }
}

impl FromIterator<QueueItem> for Queue {
    fn from_iter<I: IntoIterator<Item = QueueItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

/// One line per item, indented two spaces per open block
impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut indent = 0usize;
        for item in &self.items {
            if item.closes_block() {
                indent = indent.saturating_sub(2);
            }
            writeln!(f, "{:indent$}{}", "", item, indent = indent)?;
            if item.opens_block() {
                indent += 2;
            }
        }
        Ok(())
    }
}
