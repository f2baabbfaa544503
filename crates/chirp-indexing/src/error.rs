//! Error types for index synchronization and rebuilds.

use chirp_search::SearchError;
use chirp_storage::StorageError;
use thiserror::Error;

/// Errors that can occur while synchronizing or rebuilding the index
#[derive(Error, Debug)]
pub enum IndexingError {
    /// Storage operation failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Search index error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IndexingError::Storage(StorageError::NotFound("post-1".to_string()));
        assert!(err.to_string().contains("post-1"));
    }
}
