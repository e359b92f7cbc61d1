//! Error types for the RL core library

use thiserror::Error;

/// Core error type for RL operations
#[derive(Error, Debug)]
pub enum RLError {
    /// Invalid action
    #[error("Invalid action: {0}")]
    InvalidAction(String),

    /// Invalid environment or agent configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The episode already reached a terminal outcome
    #[error("Episode finished ({reason}); call reset() before stepping again")]
    EpisodeFinished {
        /// Terminal reason of the finished episode
        reason: String,
    },

    /// A saved model could not be reconstructed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for RL operations
pub type Result<T> = std::result::Result<T, RLError>;
