//! RocksDB wrapper for the chirp primary store.
//!
//! Provides:
//! - Database open with column family setup
//! - Session creation and commit-hook registration
//! - Typed single-key reads and time-ordered prefix scans

use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use tracing::{info, warn};

use chirp_types::{Message, Notification, Post, TaskRecord, User};

use crate::column_families::{
    build_cf_descriptors, CF_FOLLOWS, CF_MESSAGES, CF_NOTIFICATIONS, CF_POSTS, CF_POSTS_BY_USER,
    CF_TASKS, CF_USERS,
};
use crate::error::StorageError;
use crate::keys::{FollowKey, MessageKey, NotificationKey, PostKey, TaskKey, UserKey, UserPostKey};
use crate::session::{CommitHook, Session};

/// Main storage interface for chirp.
pub struct Store {
    db: DB,
    hooks: RwLock<Vec<Arc<dyn CommitHook>>>,
}

impl Store {
    /// Open storage at the given path, creating if necessary.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening store at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        db_opts.set_max_background_jobs(4);

        let cf_descriptors = build_cf_descriptors();
        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        Ok(Self {
            db,
            hooks: RwLock::new(Vec::new()),
        })
    }

    /// Register a commit hook. Hooks run in registration order around every
    /// session commit.
    pub fn register_hook(&self, hook: Arc<dyn CommitHook>) {
        self.hooks.write().unwrap_or_else(|e| e.into_inner()).push(hook);
    }

    /// Snapshot of the registered hooks.
    pub(crate) fn hooks(&self) -> Vec<Arc<dyn CommitHook>> {
        self.hooks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Begin a new unit of work.
    pub fn session(&self) -> Session<'_> {
        Session::new(self)
    }

    pub(crate) fn cf(&self, name: &str) -> Result<&ColumnFamily, StorageError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(name.to_string()))
    }

    pub(crate) fn write_batch(&self, batch: WriteBatch) -> Result<(), StorageError> {
        self.db.write(batch)?;
        Ok(())
    }

    /// Iterate all `(key, value)` pairs whose key starts with `prefix`.
    fn prefix_scan(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StorageError> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut results = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key.to_vec(), value.to_vec()));
        }
        Ok(results)
    }

    // ==================== Users ====================

    /// Get a user by id.
    pub fn get_user(&self, user_id: &str) -> Result<Option<User>, StorageError> {
        let cf = self.cf(CF_USERS)?;
        match self.db.get_cf(&cf, UserKey::new(user_id).to_bytes())? {
            Some(bytes) => Ok(Some(User::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Find a user by username. Scans the users column family.
    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>, StorageError> {
        for (_key, value) in self.prefix_scan(CF_USERS, b"user:")? {
            let user = User::from_bytes(&value)?;
            if user.username == username {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    // ==================== Posts ====================

    /// Get a post by id.
    pub fn get_post(&self, post_id: &str) -> Result<Option<Post>, StorageError> {
        let cf = self.cf(CF_POSTS)?;
        let key = PostKey::from_post_id(post_id)?;
        match self.db.get_cf(&cf, key.to_bytes())? {
            Some(bytes) => Ok(Some(Post::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All posts by one author, creation time ascending.
    pub fn posts_by_user(&self, user_id: &str) -> Result<Vec<Post>, StorageError> {
        let mut posts = Vec::new();
        for (key, value) in self.prefix_scan(CF_POSTS_BY_USER, &UserPostKey::prefix(user_id))? {
            let post_id = String::from_utf8(value)
                .map_err(|e| StorageError::Serialization(e.to_string()))?;
            match self.get_post(&post_id)? {
                Some(post) => posts.push(post),
                None => {
                    let key_str = String::from_utf8_lossy(&key).into_owned();
                    warn!(key = %key_str, post_id = %post_id, "Dangling author pointer");
                }
            }
        }
        Ok(posts)
    }

    /// Number of posts by one author.
    pub fn count_posts_by_user(&self, user_id: &str) -> Result<usize, StorageError> {
        Ok(self
            .prefix_scan(CF_POSTS_BY_USER, &UserPostKey::prefix(user_id))?
            .len())
    }

    /// All posts in the store, creation time ascending. Used for index
    /// rebuilds and admin tooling.
    pub fn all_posts(&self) -> Result<Vec<Post>, StorageError> {
        let mut posts = Vec::new();
        for (_key, value) in self.prefix_scan(CF_POSTS, b"post:")? {
            posts.push(Post::from_bytes(&value)?);
        }
        Ok(posts)
    }

    // ==================== Follows ====================

    /// True if `follower_id` follows `followed_id`.
    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool, StorageError> {
        let cf = self.cf(CF_FOLLOWS)?;
        let key = FollowKey::new(follower_id, followed_id);
        Ok(self.db.get_cf(&cf, key.to_bytes())?.is_some())
    }

    /// Ids of everyone `follower_id` follows.
    pub fn following_ids(&self, follower_id: &str) -> Result<Vec<String>, StorageError> {
        let mut ids = Vec::new();
        for (key, _value) in self.prefix_scan(CF_FOLLOWS, &FollowKey::prefix(follower_id))? {
            let decoded = FollowKey::from_bytes(&key)?;
            ids.push(decoded.followed_id);
        }
        Ok(ids)
    }

    // ==================== Messages ====================

    /// All messages in one recipient's inbox, creation time ascending.
    pub fn messages_for(&self, recipient_id: &str) -> Result<Vec<Message>, StorageError> {
        let mut messages = Vec::new();
        for (_key, value) in self.prefix_scan(CF_MESSAGES, &MessageKey::prefix(recipient_id))? {
            messages.push(Message::from_bytes(&value)?);
        }
        Ok(messages)
    }

    /// Count messages received strictly after `since` (all of them when
    /// `since` is `None`).
    pub fn unread_message_count(
        &self,
        recipient_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<usize, StorageError> {
        let since_ms = since.map(|t| t.timestamp_millis()).unwrap_or(i64::MIN);
        let count = self
            .messages_for(recipient_id)?
            .iter()
            .filter(|m| m.created_ms() > since_ms)
            .count();
        Ok(count)
    }

    // ==================== Notifications ====================

    /// All notifications for a user, creation time ascending.
    pub fn notifications_for(&self, user_id: &str) -> Result<Vec<Notification>, StorageError> {
        let mut notifications = Vec::new();
        for (_key, value) in self.prefix_scan(CF_NOTIFICATIONS, &NotificationKey::prefix(user_id))?
        {
            notifications.push(Notification::from_bytes(&value)?);
        }
        Ok(notifications)
    }

    /// Notifications created strictly after `since_ms`, ascending by
    /// timestamp. This is the web layer's poll endpoint.
    pub fn notifications_since(
        &self,
        user_id: &str,
        since_ms: i64,
    ) -> Result<Vec<Notification>, StorageError> {
        Ok(self
            .notifications_for(user_id)?
            .into_iter()
            .filter(|n| n.created_ms() > since_ms)
            .collect())
    }

    // ==================== Tasks ====================

    /// Get a task progress record by its queue job id.
    pub fn get_task(&self, task_id: &str) -> Result<Option<TaskRecord>, StorageError> {
        let cf = self.cf(CF_TASKS)?;
        match self.db.get_cf(&cf, TaskKey::new(task_id).to_bytes())? {
            Some(bytes) => Ok(Some(TaskRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// All task records owned by a user.
    pub fn tasks_for_user(&self, user_id: &str) -> Result<Vec<TaskRecord>, StorageError> {
        let mut records = Vec::new();
        for (_key, value) in self.prefix_scan(CF_TASKS, b"task:")? {
            let record = TaskRecord::from_bytes(&value)?;
            if record.user_id == user_id {
                records.push(record);
            }
        }
        Ok(records)
    }

    /// Incomplete task records owned by a user.
    pub fn tasks_in_progress(&self, user_id: &str) -> Result<Vec<TaskRecord>, StorageError> {
        Ok(self
            .tasks_for_user(user_id)?
            .into_iter()
            .filter(|t| !t.complete)
            .collect())
    }
}
