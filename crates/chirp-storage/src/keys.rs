//! Key encoding and decoding for the storage layer.
//!
//! Time-ordered keys use the format `{prefix}:{timestamp_ms}:{ulid}`:
//! - prefix: identifies the key type or scopes it to an owner
//! - timestamp_ms: milliseconds since Unix epoch, zero-padded to 13 digits
//! - ulid: 26-character ULID for uniqueness within the same millisecond
//!
//! Zero-padding makes lexicographic key order equal creation-time order, so
//! feed and inbox reads are plain prefix scans.

use ulid::Ulid;

use crate::error::StorageError;

/// Key for post storage
/// Format: `post:{timestamp_ms:013}:{ulid}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostKey {
    /// Creation timestamp in milliseconds
    pub created_ms: i64,
    /// Unique identifier (also serves as post_id)
    pub ulid: Ulid,
}

impl PostKey {
    /// Create a post key from a post_id string (the ULID portion).
    /// Uses the ULID's embedded timestamp.
    pub fn from_post_id(post_id: &str) -> Result<Self, StorageError> {
        let ulid: Ulid = post_id
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid post_id ULID: {}", e)))?;
        Ok(Self {
            created_ms: ulid.timestamp_ms() as i64,
            ulid,
        })
    }

    /// Encode key to bytes for storage.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("post:{:013}:{}", self.created_ms, self.ulid).into_bytes()
    }

    /// Decode key from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "post" {
            return Err(StorageError::Key(format!("Invalid post key format: {}", s)));
        }
        let created_ms: i64 = parts[1]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))?;
        let ulid: Ulid = parts[2]
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid ULID: {}", e)))?;
        Ok(Self { created_ms, ulid })
    }

    /// Get the post_id (ULID string) for this key.
    pub fn post_id(&self) -> String {
        self.ulid.to_string()
    }
}

/// Key for the per-author post pointer
/// Format: `user:{user_id}:{timestamp_ms:013}:{ulid}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPostKey {
    pub user_id: String,
    pub created_ms: i64,
    pub ulid: Ulid,
}

impl UserPostKey {
    pub fn new(user_id: impl Into<String>, created_ms: i64, ulid: Ulid) -> Self {
        Self {
            user_id: user_id.into(),
            created_ms,
            ulid,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("user:{}:{:013}:{}", self.user_id, self.created_ms, self.ulid).into_bytes()
    }

    /// Scan prefix covering all posts of one author.
    pub fn prefix(user_id: &str) -> Vec<u8> {
        format!("user:{}:", user_id).into_bytes()
    }
}

/// Key for follow edges
/// Format: `follow:{follower_id}:{followed_id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowKey {
    pub follower_id: String,
    pub followed_id: String,
}

impl FollowKey {
    pub fn new(follower_id: impl Into<String>, followed_id: impl Into<String>) -> Self {
        Self {
            follower_id: follower_id.into(),
            followed_id: followed_id.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("follow:{}:{}", self.follower_id, self.followed_id).into_bytes()
    }

    /// Scan prefix covering everyone a follower follows.
    pub fn prefix(follower_id: &str) -> Vec<u8> {
        format!("follow:{}:", follower_id).into_bytes()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 3 || parts[0] != "follow" {
            return Err(StorageError::Key(format!(
                "Invalid follow key format: {}",
                s
            )));
        }
        Ok(Self {
            follower_id: parts[1].to_string(),
            followed_id: parts[2].to_string(),
        })
    }
}

/// Key for private messages, scoped to the recipient's inbox
/// Format: `msg:{recipient_id}:{timestamp_ms:013}:{ulid}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageKey {
    pub recipient_id: String,
    pub created_ms: i64,
    pub ulid: Ulid,
}

impl MessageKey {
    pub fn new(recipient_id: impl Into<String>, created_ms: i64, ulid: Ulid) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            created_ms,
            ulid,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "msg:{}:{:013}:{}",
            self.recipient_id, self.created_ms, self.ulid
        )
        .into_bytes()
    }

    /// Scan prefix covering one recipient's inbox.
    pub fn prefix(recipient_id: &str) -> Vec<u8> {
        format!("msg:{}:", recipient_id).into_bytes()
    }
}

/// Key for notifications, scoped to the owning user
/// Format: `ntf:{user_id}:{timestamp_ms:013}:{ulid}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationKey {
    pub user_id: String,
    pub created_ms: i64,
    pub ulid: Ulid,
}

impl NotificationKey {
    pub fn new(user_id: impl Into<String>, created_ms: i64, ulid: Ulid) -> Self {
        Self {
            user_id: user_id.into(),
            created_ms,
            ulid,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("ntf:{}:{:013}:{}", self.user_id, self.created_ms, self.ulid).into_bytes()
    }

    /// Scan prefix covering one user's notification log.
    pub fn prefix(user_id: &str) -> Vec<u8> {
        format!("ntf:{}:", user_id).into_bytes()
    }
}

/// Key for user records
/// Format: `user:{user_id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserKey {
    pub user_id: String,
}

impl UserKey {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("user:{}", self.user_id).into_bytes()
    }
}

/// Key for task progress records
/// Format: `task:{task_id}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskKey {
    pub task_id: String,
}

impl TaskKey {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!("task:{}", self.task_id).into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_key_roundtrip() {
        let ulid = Ulid::new();
        let key = PostKey {
            created_ms: ulid.timestamp_ms() as i64,
            ulid,
        };
        let bytes = key.to_bytes();
        let decoded = PostKey::from_bytes(&bytes).unwrap();
        assert_eq!(key, decoded);
    }

    #[test]
    fn test_post_key_from_post_id() {
        let ulid = Ulid::new();
        let key = PostKey::from_post_id(&ulid.to_string()).unwrap();
        assert_eq!(key.ulid, ulid);
        assert_eq!(key.created_ms, ulid.timestamp_ms() as i64);
        assert_eq!(key.post_id(), ulid.to_string());
    }

    #[test]
    fn test_post_key_lexicographic_order() {
        let key1 = PostKey {
            created_ms: 1000,
            ulid: Ulid::new(),
        };
        let key2 = PostKey {
            created_ms: 2000,
            ulid: Ulid::new(),
        };
        assert!(key1.to_bytes() < key2.to_bytes());
    }

    #[test]
    fn test_post_key_rejects_garbage() {
        assert!(PostKey::from_post_id("not-a-ulid").is_err());
        assert!(PostKey::from_bytes(b"evt:123:abc").is_err());
    }

    #[test]
    fn test_user_post_key_prefix() {
        let ulid = Ulid::new();
        let key = UserPostKey::new("owner", 1234, ulid);
        let bytes = key.to_bytes();
        assert!(bytes.starts_with(&UserPostKey::prefix("owner")));
        assert!(!bytes.starts_with(&UserPostKey::prefix("other")));
    }

    #[test]
    fn test_follow_key_roundtrip() {
        let key = FollowKey::new("alice-id", "bob-id");
        let decoded = FollowKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, decoded);
        assert!(key.to_bytes().starts_with(&FollowKey::prefix("alice-id")));
    }

    #[test]
    fn test_message_key_orders_by_time() {
        let key1 = MessageKey::new("r", 1000, Ulid::new());
        let key2 = MessageKey::new("r", 2000, Ulid::new());
        assert!(key1.to_bytes() < key2.to_bytes());
    }
}
