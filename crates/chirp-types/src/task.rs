//! Task progress record.
//!
//! Correlates a queue job id with the owning user and a user-visible
//! description. The completion flag only ever moves false -> true; the
//! worker is the sole writer after creation.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// Persisted record of a background task, keyed by its queue job id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Queue job id (opaque string assigned by the queue client)
    pub task_id: String,

    /// Owning user
    pub user_id: String,

    /// Name of the job routine that ran (e.g. "export_posts")
    pub name: String,

    /// Human-readable description shown to the user
    pub description: String,

    /// Completion flag; set true exactly once at finalization
    #[serde(default)]
    pub complete: bool,
}

impl TaskRecord {
    /// Collection name used as the storage namespace.
    pub const COLLECTION: &'static str = "task";

    /// Create a new, incomplete task record.
    pub fn new(
        task_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: description.into(),
            complete: false,
        }
    }

    /// Serialize to JSON bytes for storage.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl Entity for TaskRecord {
    fn entity_id(&self) -> String {
        self.task_id.clone()
    }

    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }
}
