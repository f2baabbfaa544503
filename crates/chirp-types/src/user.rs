//! User account record.
//!
//! Authentication material (passwords, tokens, sessions) lives outside this
//! core and is intentionally absent here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::entity::Entity;

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (ULID string)
    pub user_id: String,

    /// Display/handle name
    pub username: String,

    /// Email address used for outbound delivery
    pub email: String,

    /// Short self-description
    #[serde(default)]
    pub about_me: Option<String>,

    /// High-water mark for read private messages
    #[serde(default)]
    pub messages_last_read: Option<DateTime<Utc>>,

    /// Registration time
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Collection name used as the storage namespace.
    pub const COLLECTION: &'static str = "user";

    /// Create a new user with a fresh ULID.
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: Ulid::new().to_string(),
            username: username.into(),
            email: email.into(),
            about_me: None,
            messages_last_read: None,
            created_at: Utc::now(),
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

impl Entity for User {
    fn entity_id(&self) -> String {
        self.user_id.clone()
    }

    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_roundtrip() {
        let user = User::new("susan", "susan@example.com");
        let bytes = user.to_bytes().unwrap();
        let decoded = User::from_bytes(&bytes).unwrap();

        assert_eq!(user.user_id, decoded.user_id);
        assert_eq!(user.username, decoded.username);
        assert_eq!(user.email, decoded.email);
    }

    #[test]
    fn test_user_is_not_searchable() {
        let user = User::new("susan", "susan@example.com");
        assert!(user.as_searchable().is_none());
    }
}
