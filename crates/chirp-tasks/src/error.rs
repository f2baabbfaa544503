//! Error types for the task crate.

use chirp_storage::StorageError;
use thiserror::Error;

/// Errors that can occur during task queueing and execution.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The queue has no live consumer; the job was not enqueued
    #[error("Task queue is closed")]
    QueueClosed,

    /// No routine registered under the requested name
    #[error("Unknown job routine: {0}")]
    UnknownRoutine(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Outbound mail delivery failed
    #[error("Mail delivery error: {0}")]
    Mail(String),

    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(TaskError::QueueClosed.to_string().contains("closed"));
        assert!(TaskError::UnknownRoutine("nope".into())
            .to_string()
            .contains("nope"));
    }
}
