//! Unit-of-work session with commit hooks.
//!
//! A [`Session`] stages typed writes into a RocksDB `WriteBatch` and records
//! every staged entity into a [`ChangeSet`]. `commit()` materializes the
//! change-set, runs pre-commit hooks, writes the batch atomically, then runs
//! post-commit hooks with the same change-set. Post-commit hooks must not
//! fail the commit: the primary write has already succeeded, so hook
//! implementations log their own failures instead of returning them.

use std::sync::Arc;

use rocksdb::WriteBatch;
use serde_json::Value;
use tracing::debug;
use ulid::Ulid;

use chirp_types::{ChangeSet, Message, Notification, Post, TaskRecord, User};

use crate::column_families::{
    CF_FOLLOWS, CF_MESSAGES, CF_NOTIFICATIONS, CF_POSTS, CF_POSTS_BY_USER, CF_TASKS, CF_USERS,
};
use crate::db::Store;
use crate::error::StorageError;
use crate::keys::{FollowKey, MessageKey, NotificationKey, PostKey, TaskKey, UserKey, UserPostKey};

/// Callbacks invoked around each session commit.
///
/// Hooks are registered on the [`Store`] and run deterministically in
/// registration order for every committed session.
pub trait CommitHook: Send + Sync {
    /// Runs after the change-set is captured, before the batch is written.
    fn before_commit(&self, _changes: &ChangeSet) {}

    /// Runs after the batch was written successfully. The primary write can
    /// no longer fail; implementations handle their own errors.
    fn after_commit(&self, _changes: &ChangeSet) {}
}

/// A unit of work over the store.
///
/// All staged writes land in one atomic batch; nothing is visible to
/// readers until `commit()` succeeds.
pub struct Session<'a> {
    store: &'a Store,
    batch: WriteBatch,
    changes: ChangeSet,
}

impl<'a> Session<'a> {
    pub(crate) fn new(store: &'a Store) -> Self {
        Self {
            store,
            batch: WriteBatch::default(),
            changes: ChangeSet::new(),
        }
    }

    /// Stage a new user record.
    pub fn create_user(&mut self, user: &User) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_USERS)?;
        self.batch
            .put_cf(&cf, UserKey::new(&user.user_id).to_bytes(), user.to_bytes()?);
        self.changes.record_added(Arc::new(user.clone()));
        Ok(())
    }

    /// Stage an update to an existing user record.
    pub fn update_user(&mut self, user: &User) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_USERS)?;
        self.batch
            .put_cf(&cf, UserKey::new(&user.user_id).to_bytes(), user.to_bytes()?);
        self.changes.record_updated(Arc::new(user.clone()));
        Ok(())
    }

    /// Stage a new post: the body under its time-prefixed key plus the
    /// per-author pointer.
    pub fn create_post(&mut self, post: &Post) -> Result<(), StorageError> {
        self.put_post(post)?;
        self.changes.record_added(Arc::new(post.clone()));
        Ok(())
    }

    /// Stage an update to an existing post. The key is derived from the
    /// post id, so edits overwrite in place.
    pub fn update_post(&mut self, post: &Post) -> Result<(), StorageError> {
        self.put_post(post)?;
        self.changes.record_updated(Arc::new(post.clone()));
        Ok(())
    }

    fn put_post(&mut self, post: &Post) -> Result<(), StorageError> {
        let posts_cf = self.store.cf(CF_POSTS)?;
        let by_user_cf = self.store.cf(CF_POSTS_BY_USER)?;

        let key = PostKey::from_post_id(&post.post_id)?;
        let pointer = UserPostKey::new(&post.user_id, key.created_ms, key.ulid);

        self.batch.put_cf(&posts_cf, key.to_bytes(), post.to_bytes()?);
        self.batch
            .put_cf(&by_user_cf, pointer.to_bytes(), post.post_id.as_bytes());
        Ok(())
    }

    /// Stage the deletion of a post and its author pointer.
    pub fn delete_post(&mut self, post: &Post) -> Result<(), StorageError> {
        let posts_cf = self.store.cf(CF_POSTS)?;
        let by_user_cf = self.store.cf(CF_POSTS_BY_USER)?;

        let key = PostKey::from_post_id(&post.post_id)?;
        let pointer = UserPostKey::new(&post.user_id, key.created_ms, key.ulid);

        self.batch.delete_cf(&posts_cf, key.to_bytes());
        self.batch.delete_cf(&by_user_cf, pointer.to_bytes());
        self.changes.record_deleted(Arc::new(post.clone()));
        Ok(())
    }

    /// Stage a new private message.
    pub fn create_message(&mut self, message: &Message) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_MESSAGES)?;
        let ulid: Ulid = message
            .message_id
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid message_id ULID: {}", e)))?;
        let key = MessageKey::new(&message.recipient_id, message.created_ms(), ulid);
        self.batch.put_cf(&cf, key.to_bytes(), message.to_bytes()?);
        self.changes.record_added(Arc::new(message.clone()));
        Ok(())
    }

    /// Stage a notification for a user, replacing any live notification on
    /// the same channel so each named channel holds at most one current
    /// value. Returns the staged notification.
    pub fn add_notification(
        &mut self,
        user_id: &str,
        name: &str,
        payload: Value,
    ) -> Result<Notification, StorageError> {
        let cf = self.store.cf(CF_NOTIFICATIONS)?;

        // Replace-then-insert: drop the previous value on this channel.
        for existing in self.store.notifications_for(user_id)? {
            if existing.name == name {
                let ulid: Ulid = existing
                    .notification_id
                    .parse()
                    .map_err(|e| StorageError::Key(format!("Invalid notification ULID: {}", e)))?;
                let key = NotificationKey::new(user_id, existing.created_ms(), ulid);
                self.batch.delete_cf(&cf, key.to_bytes());
                self.changes.record_deleted(Arc::new(existing));
            }
        }

        let notification = Notification::new(user_id, name, payload);
        let ulid: Ulid = notification
            .notification_id
            .parse()
            .map_err(|e| StorageError::Key(format!("Invalid notification ULID: {}", e)))?;
        let key = NotificationKey::new(user_id, notification.created_ms(), ulid);
        self.batch
            .put_cf(&cf, key.to_bytes(), notification.to_bytes()?);
        self.changes.record_added(Arc::new(notification.clone()));
        Ok(notification)
    }

    /// Stage a new task progress record.
    pub fn create_task(&mut self, record: &TaskRecord) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_TASKS)?;
        self.batch.put_cf(
            &cf,
            TaskKey::new(&record.task_id).to_bytes(),
            record.to_bytes()?,
        );
        self.changes.record_added(Arc::new(record.clone()));
        Ok(())
    }

    /// Stage an update to a task progress record (completion flag).
    pub fn update_task(&mut self, record: &TaskRecord) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_TASKS)?;
        self.batch.put_cf(
            &cf,
            TaskKey::new(&record.task_id).to_bytes(),
            record.to_bytes()?,
        );
        self.changes.record_updated(Arc::new(record.clone()));
        Ok(())
    }

    /// Stage a follow edge. Edges are not entities and are not change-tracked.
    pub fn follow(&mut self, follower_id: &str, followed_id: &str) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_FOLLOWS)?;
        let key = FollowKey::new(follower_id, followed_id);
        let stamp = chrono::Utc::now().timestamp_millis().to_string();
        self.batch.put_cf(&cf, key.to_bytes(), stamp.as_bytes());
        Ok(())
    }

    /// Stage removal of a follow edge.
    pub fn unfollow(&mut self, follower_id: &str, followed_id: &str) -> Result<(), StorageError> {
        let cf = self.store.cf(CF_FOLLOWS)?;
        let key = FollowKey::new(follower_id, followed_id);
        self.batch.delete_cf(&cf, key.to_bytes());
        Ok(())
    }

    /// Number of staged entity changes.
    pub fn change_count(&self) -> usize {
        self.changes.len()
    }

    /// Commit the unit of work.
    ///
    /// Capture order: the change-set snapshot is taken first, pre-commit
    /// hooks observe it, then the batch is written atomically, then
    /// post-commit hooks consume the same snapshot.
    pub fn commit(self) -> Result<(), StorageError> {
        let Session {
            store,
            batch,
            changes,
        } = self;

        let hooks = store.hooks();
        for hook in &hooks {
            hook.before_commit(&changes);
        }

        store.write_batch(batch)?;
        debug!(changes = changes.len(), "Session committed");

        for hook in &hooks {
            hook.after_commit(&changes);
        }
        Ok(())
    }
}
