//! Bracket matching over flat queues
//!
//! Loop and conditional bodies are stored inline between a start marker and
//! its matching `LoopEnd`. These helpers find that span and check that every
//! marker in a queue has a partner.

use std::fmt;

use crate::error::{LooperError, Result};

use super::item::QueueItem;

/// Body of a block found by [`match_block`]
#[derive(Debug)]
pub struct Block<'a> {
    /// Items strictly between the start marker and its matching end
    pub body: &'a [QueueItem],
    /// Index just after the matching end marker
    pub resume: usize,
    /// False when the queue ran out before the block closed
    pub closed: bool,
}

/// Ways a queue's markers can fail to pair up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Imbalance {
    /// A `LoopEnd` with no open block
    StrayEnd,
    /// A start marker never closed
    UnclosedStart,
}

impl fmt::Display for Imbalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Imbalance::StrayEnd => f.write_str("end marker without a matching start"),
            Imbalance::UnclosedStart => f.write_str("loop or condition is never closed"),
        }
    }
}

/// Find the body of the block opened at `start`.
///
/// Scans forward with a nesting counter starting at 1. If the queue ends
/// before the counter reaches zero, everything after `start` is returned
/// with `closed == false`.
pub fn match_block(items: &[QueueItem], start: usize) -> Block<'_> {
    let first = (start + 1).min(items.len());
    let mut nesting = 1usize;

    for (index, item) in items.iter().enumerate().skip(first) {
        if item.opens_block() {
            nesting += 1;
        } else if item.closes_block() {
            nesting -= 1;
            if nesting == 0 {
                return Block {
                    body: &items[first..index],
                    resume: index + 1,
                    closed: true,
                };
            }
        }
    }

    Block {
        body: &items[first..],
        resume: items.len(),
        closed: false,
    }
}

/// Check that every start marker has a matching end and no end is stray.
///
/// The error names the first offending item: the stray `LoopEnd`, or the
/// outermost start marker left open at the end of the queue.
pub fn validate_balance(items: &[QueueItem]) -> Result<()> {
    let mut open: Vec<usize> = Vec::new();

    for (index, item) in items.iter().enumerate() {
        if item.opens_block() {
            open.push(index);
        } else if item.closes_block() && open.pop().is_none() {
            return Err(LooperError::UnbalancedQueue {
                index,
                kind: Imbalance::StrayEnd,
            });
        }
    }

    match open.first() {
        Some(&index) => Err(LooperError::UnbalancedQueue {
            index,
            kind: Imbalance::UnclosedStart,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::FnAction;
    use std::time::Duration;

    fn action(label: &str) -> QueueItem {
        QueueItem::action(label, FnAction::new(|| Ok(())))
    }

    fn start(count: u32) -> QueueItem {
        QueueItem::loop_start(count, Duration::ZERO, None).unwrap()
    }

    fn labels(items: &[QueueItem]) -> Vec<String> {
        items.iter().map(|i| i.to_string()).collect()
    }

    #[test]
    fn test_match_simple_block() {
        let items = vec![start(2), action("a"), action("b"), QueueItem::loop_end(), action("c")];
        let block = match_block(&items, 0);

        assert!(block.closed);
        assert_eq!(block.resume, 4);
        assert_eq!(labels(block.body), vec!["- a", "- b"]);
    }

    #[test]
    fn test_match_nested_block_keeps_inner_markers() {
        let items = vec![
            start(2),
            action("a"),
            start(3),
            action("b"),
            QueueItem::loop_end(),
            QueueItem::loop_end(),
            action("c"),
        ];
        let block = match_block(&items, 0);

        assert!(block.closed);
        assert_eq!(block.resume, 6);
        assert_eq!(block.body.len(), 4);
        assert!(block.body[1].opens_block());
        assert!(block.body[3].closes_block());

        let inner = match_block(&items, 2);
        assert_eq!(inner.resume, 5);
        assert_eq!(labels(inner.body), vec!["- b"]);
    }

    #[test]
    fn test_match_empty_body() {
        let items = vec![start(1), QueueItem::loop_end()];
        let block = match_block(&items, 0);
        assert!(block.closed);
        assert!(block.body.is_empty());
        assert_eq!(block.resume, 2);
    }

    #[test]
    fn test_match_unclosed_is_best_effort() {
        let items = vec![start(2), action("a"), start(2), action("b"), QueueItem::loop_end()];
        let block = match_block(&items, 0);

        assert!(!block.closed);
        assert_eq!(block.resume, items.len());
        assert_eq!(block.body.len(), 4);
    }

    #[test]
    fn test_match_start_at_last_index() {
        let items = vec![action("a"), start(2)];
        let block = match_block(&items, 1);
        assert!(!block.closed);
        assert!(block.body.is_empty());
        assert_eq!(block.resume, 2);
    }

    #[test]
    fn test_validate_balanced() {
        let items = vec![start(2), start(2), QueueItem::loop_end(), QueueItem::loop_end()];
        assert!(validate_balance(&items).is_ok());
        assert!(validate_balance(&[]).is_ok());
    }

    #[test]
    fn test_validate_stray_end() {
        let items = vec![action("a"), QueueItem::loop_end(), start(1), QueueItem::loop_end()];
        let err = validate_balance(&items).unwrap_err();
        assert!(matches!(
            err,
            LooperError::UnbalancedQueue {
                index: 1,
                kind: Imbalance::StrayEnd
            }
        ));
    }

    #[test]
    fn test_validate_unclosed_reports_outermost() {
        let items = vec![action("a"), start(2), start(2), QueueItem::loop_end()];
        let err = validate_balance(&items).unwrap_err();
        assert!(matches!(
            err,
            LooperError::UnbalancedQueue {
                index: 1,
                kind: Imbalance::UnclosedStart
            }
        ));
    }
}
