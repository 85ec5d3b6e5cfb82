//! CLI module for queuelooper - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
