//! Post type: the unit of authored content.
//!
//! Posts are the canonical searchable entity. The post id is a ULID whose
//! embedded timestamp doubles as the creation time, so storage keys and
//! feed ordering derive from the id alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::entity::{Entity, Searchable};

/// A short authored post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique identifier (ULID string; embeds creation time)
    pub post_id: String,

    /// Author
    pub user_id: String,

    /// Post text
    pub body: String,

    /// Detected language tag, if any (e.g. "en")
    #[serde(default)]
    pub language: Option<String>,

    /// Creation time (matches the ULID timestamp)
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Collection name used as the storage and index namespace.
    pub const COLLECTION: &'static str = "post";

    /// Create a new post with a fresh ULID.
    pub fn new(user_id: impl Into<String>, body: impl Into<String>) -> Self {
        let ulid = Ulid::new();
        let created_at = DateTime::<Utc>::from_timestamp_millis(ulid.timestamp_ms() as i64)
            .unwrap_or_else(Utc::now);
        Self {
            post_id: ulid.to_string(),
            user_id: user_id.into(),
            body: body.into(),
            language: None,
            created_at,
            updated_at: created_at,
        }
    }

    /// Set the language tag.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
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

impl Entity for Post {
    fn entity_id(&self) -> String {
        self.post_id.clone()
    }

    fn collection(&self) -> &'static str {
        Self::COLLECTION
    }

    fn as_searchable(&self) -> Option<&dyn Searchable> {
        Some(self)
    }
}

impl Searchable for Post {
    fn searchable_fields(&self) -> Vec<(&'static str, String)> {
        vec![("body", self.body.clone())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_serialization_roundtrip() {
        let post = Post::new("user-1", "hello world").with_language("en");
        let bytes = post.to_bytes().unwrap();
        let decoded = Post::from_bytes(&bytes).unwrap();

        assert_eq!(post.post_id, decoded.post_id);
        assert_eq!(post.body, decoded.body);
        assert_eq!(post.language, decoded.language);
    }

    #[test]
    fn test_post_id_embeds_creation_time() {
        let post = Post::new("user-1", "hello");
        let ulid: Ulid = post.post_id.parse().unwrap();
        assert_eq!(ulid.timestamp_ms() as i64, post.created_ms());
    }

    #[test]
    fn test_post_is_searchable() {
        let post = Post::new("user-1", "searchable text");
        let searchable = post.as_searchable().unwrap();
        let fields = searchable.searchable_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0, "body");
        assert_eq!(fields[0].1, "searchable text");
        assert_eq!(post.collection(), "post");
    }
}
