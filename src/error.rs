//! Error types for queuelooper
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

use crate::queue::Imbalance;

/// All error types that can occur while building or running a queue
#[derive(Debug, Error)]
pub enum LooperError {
    /// A step was constructed with values outside its allowed range
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    /// Loop markers do not pair up
    #[error("Unbalanced queue at item {index}: {kind}")]
    UnbalancedQueue { index: usize, kind: Imbalance },

    /// A trigger names a measurement nobody registered
    #[error("Unknown trigger: {0}")]
    UnknownTrigger(String),

    /// An action operation failed
    #[error("Action failed: {0}")]
    Action(String),

    /// A trigger measurement could not be taken
    #[error("Measurement failed: {0}")]
    Measurement(String),

    /// The instrument collaborator reported a problem
    #[error("Instrument error: {0}")]
    Instrument(String),

    /// A queue file could not be understood
    #[error("Queue file error: {0}")]
    QueueFile(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for queuelooper operations
pub type Result<T> = std::result::Result<T, LooperError>;
