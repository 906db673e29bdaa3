//! Error types for the Topofeed SDK.

use thiserror::Error;

/// Errors raised while setting up or talking to a feed.
///
/// Delta handling itself never fails: empty deltas are dropped and sink
/// failures are logged and counted instead of propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No tokio runtime available to drive the drain timer")]
    NoRuntime,

    #[error("Consumer sink is closed")]
    SinkClosed,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for FeedError {
    fn from(err: std::io::Error) -> Self {
        FeedError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        FeedError::Serialization(err.to_string())
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, FeedError>;
