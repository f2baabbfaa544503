//! Notification records polled by the web layer.
//!
//! A notification's creation timestamp is the cursor clients poll with:
//! "give me everything after `since`". Channels named as singletons (e.g.
//! `unread_message_count`) are replaced on write rather than accumulated,
//! so a channel holds at most one live "current value" per name.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::entity::Entity;

/// Channel name for live task progress updates.
pub const CHANNEL_TASK_PROGRESS: &str = "task_progress";

/// Channel name for the unread private-message counter.
pub const CHANNEL_UNREAD_MESSAGES: &str = "unread_message_count";

/// A single notification destined for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    /// Unique identifier (ULID string; embeds creation time)
    pub notification_id: String,

    /// Owning user
    pub user_id: String,

    /// Channel/category name (e.g. "task_progress")
    pub name: String,

    /// Structured payload, serialized as-is
    pub payload: serde_json::Value,

    /// Creation time, used as the poll cursor
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Collection name used as the storage namespace.
    pub const COLLECTION: &'static str = "notification";

    /// Create a new notification with a fresh ULID.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        let ulid = Ulid::new();
        let created_at = DateTime::<Utc>::from_timestamp_millis(ulid.timestamp_ms() as i64)
            .unwrap_or_else(Utc::now);
        Self {
            notification_id: ulid.to_string(),
            user_id: user_id.into(),
            name: name.into(),
            payload,
            created_at,
        }
    }

    /// Creation time as milliseconds since Unix epoch.
    pub fn created_ms(&self) -> i64 {
        self.created_at.timestamp_millis()
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

impl Entity for Notification {
    fn entity_id(&self) -> String {
        self.notification_id.clone()
    }

    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_notification_roundtrip() {
        let n = Notification::new("user-1", CHANNEL_TASK_PROGRESS, json!({"progress": 40}));
        let bytes = n.to_bytes().unwrap();
        let decoded = Notification::from_bytes(&bytes).unwrap();

        assert_eq!(n.notification_id, decoded.notification_id);
        assert_eq!(n.name, decoded.name);
        assert_eq!(decoded.payload["progress"], 40);
    }
}
