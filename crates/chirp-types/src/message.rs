//! Private message between two users.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::entity::Entity;

/// A direct message from one user to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier (ULID string; embeds creation time)
    pub message_id: String,

    /// Sending user
    pub sender_id: String,

    /// Receiving user
    pub recipient_id: String,

    /// Message text
    pub body: String,

    /// Creation time (matches the ULID timestamp)
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Collection name used as the storage namespace.
    pub const COLLECTION: &'static str = "message";

    /// Create a new message with a fresh ULID.
    pub fn new(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let ulid = Ulid::new();
        let created_at = DateTime::<Utc>::from_timestamp_millis(ulid.timestamp_ms() as i64)
            .unwrap_or_else(Utc::now);
        Self {
            message_id: ulid.to_string(),
            sender_id: sender_id.into(),
            recipient_id: recipient_id.into(),
            body: body.into(),
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

impl Entity for Message {
    fn entity_id(&self) -> String {
        self.message_id.clone()
    }

    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roundtrip() {
        let msg = Message::new("user-a", "user-b", "hi there");
        let bytes = msg.to_bytes().unwrap();
        let decoded = Message::from_bytes(&bytes).unwrap();

        assert_eq!(msg.message_id, decoded.message_id);
        assert_eq!(msg.sender_id, decoded.sender_id);
        assert_eq!(msg.recipient_id, decoded.recipient_id);
        assert_eq!(msg.body, decoded.body);
    }
}
