//! CLI command definitions using clap.
//!
//! - run: execute a queue file until done or Ctrl-C
//! - show: print a queue file as an indented queue
//! - check: validate a queue file without running it
//! - triggers: list configured trigger names

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// queuelooper - run timed instrument queues with nested loops and triggers
#[derive(Parser, Debug)]
#[command(name = "queuelooper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a queue file
    Run {
        /// Queue file (YAML, or JSON with a .json extension)
        file: PathBuf,

        /// Top-level repetitions, overriding the file and config
        #[arg(short, long)]
        repeats: Option<u32>,

        /// Seconds each top-level repetition is padded to
        #[arg(short, long)]
        interval: Option<f64>,
    },

    /// Print the queue a file describes
    Show {
        file: PathBuf,
    },

    /// Validate markers and trigger names without running
    Check {
        file: PathBuf,
    },

    /// List configured trigger names
    Triggers,
}
