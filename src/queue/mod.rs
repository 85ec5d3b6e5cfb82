//! Queue model
//!
//! Queues are edited and displayed as a flat list of items in which loops and
//! conditionals are delimited by start/end markers:
//! - `item`: the tagged queue item and loop parameters
//! - `list`: the editable `Queue` container and its indented display
//! - `bracket`: matching start markers to their ends, balance validation
//! - `tree`: the compiled `Program` the engine executes
//! - `file`: YAML/JSON queue definitions

pub mod bracket;
pub mod file;
pub mod item;
pub mod list;
pub mod tree;

pub use bracket::{Block, Imbalance, match_block, validate_balance};
pub use file::{QueueFile, Step};
pub use item::{LoopSpec, QueueItem};
pub use list::Queue;
pub use tree::{Node, Program};
