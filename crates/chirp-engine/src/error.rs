//! Engine error types.

use chirp_indexing::IndexingError;
use chirp_search::SearchError;
use chirp_storage::StorageError;
use chirp_tasks::TaskError;
use thiserror::Error;

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search operation failed
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Index rebuild failed
    #[error("Indexing error: {0}")]
    Indexing(#[from] IndexingError),

    /// Task queueing failed
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Search was called while no index is configured
    #[error("Search is disabled: no index configured")]
    SearchDisabled,

    /// Referenced user does not exist
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Referenced post does not exist
    #[error("Post not found: {0}")]
    PostNotFound(String),

    /// Username already registered
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// A user cannot follow themselves
    #[error("Users cannot follow themselves")]
    SelfFollow,

    /// The user already has an incomplete task with this name
    #[error("Task already in progress: {0}")]
    TaskAlreadyRunning(String),

    /// The background worker was already started
    #[error("Worker already started")]
    WorkerAlreadyStarted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert!(EngineError::SearchDisabled.to_string().contains("disabled"));
        assert!(EngineError::TaskAlreadyRunning("export_posts".into())
            .to_string()
            .contains("export_posts"));
    }
}
