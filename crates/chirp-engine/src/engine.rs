//! Engine construction and operations.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use chirp_indexing::{rebuild_posts, IndexSynchronizer, RebuildStats};
use chirp_search::{EntitySearcher, SearchIndex, SearchIndexConfig, SearchWriter};
use chirp_storage::Store;
use chirp_tasks::{
    register_builtin_jobs, JobRegistry, JobTable, Mailer, QueuedJob, TaskQueue, Worker,
    EXPORT_POSTS,
};
use chirp_types::notification::CHANNEL_UNREAD_MESSAGES;
use chirp_types::{ChirpConfig, Message, Notification, Post, TaskRecord, User};

use crate::error::EngineError;
use crate::pagination::Paginated;

/// Search backend handles, present only when an index is configured.
struct SearchStack {
    writer: Arc<SearchWriter>,
    searcher: EntitySearcher,
}

/// Progress view for one task, safe to render directly.
#[derive(Debug, Clone, Serialize)]
pub struct TaskProgress {
    pub task_id: String,
    pub progress: u8,
    pub complete: bool,
}

/// The assembled chirp engine.
///
/// Holds every process-wide connection: the store, the optional search
/// stack (with the index synchronizer registered as a commit hook), the
/// job registry and the task queue. Construct once at startup and share.
pub struct Engine {
    config: ChirpConfig,
    store: Arc<Store>,
    search: Option<SearchStack>,
    registry: Arc<JobRegistry>,
    queue: TaskQueue,
    worker_rx: Mutex<Option<mpsc::UnboundedReceiver<QueuedJob>>>,
    mailer: Arc<dyn Mailer>,
}

impl Engine {
    /// Open the engine: store, optional search index plus synchronizer
    /// hook, and the task queue. The worker is not started yet; call
    /// [`Engine::start_worker`] from within a tokio runtime.
    pub fn open(config: ChirpConfig, mailer: Arc<dyn Mailer>) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::Config)?;

        let store = Arc::new(Store::open(&config.data_dir)?);

        let search = match &config.search_index_path {
            Some(path) => {
                let index = SearchIndex::open_or_create(SearchIndexConfig::new(path))?;
                let writer = Arc::new(SearchWriter::new(&index)?);
                let searcher = EntitySearcher::new(&index)?;
                store.register_hook(Arc::new(IndexSynchronizer::new(writer.clone())));
                Some(SearchStack { writer, searcher })
            }
            None => {
                info!("No search index configured; indexing and search disabled");
                None
            }
        };

        let registry = Arc::new(JobRegistry::new());
        let (queue, rx) = TaskQueue::new(registry.clone());

        Ok(Self {
            config,
            store,
            search,
            registry,
            queue,
            worker_rx: Mutex::new(Some(rx)),
            mailer,
        })
    }

    /// Spawn the background worker with the built-in job routines.
    ///
    /// Returns the worker's join handle; the worker runs until the engine
    /// (the queue's only sender) is dropped.
    pub fn start_worker(&self) -> Result<tokio::task::JoinHandle<()>, EngineError> {
        let rx = self
            .worker_rx
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .ok_or(EngineError::WorkerAlreadyStarted)?;

        let mut table = JobTable::new();
        register_builtin_jobs(&mut table);

        let worker = Worker::new(
            rx,
            table,
            self.store.clone(),
            self.registry.clone(),
            self.mailer.clone(),
        )
        .with_progress_notifications(self.config.progress_notifications);

        Ok(tokio::spawn(worker.run()))
    }

    /// The primary store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// True when a search index is configured.
    pub fn search_enabled(&self) -> bool {
        self.search.is_some()
    }

    fn search_stack(&self) -> Result<&SearchStack, EngineError> {
        self.search.as_ref().ok_or(EngineError::SearchDisabled)
    }

    // ==================== Users ====================

    /// Register a new user.
    pub fn create_user(&self, username: &str, email: &str) -> Result<User, EngineError> {
        if self.store.find_user_by_username(username)?.is_some() {
            return Err(EngineError::UsernameTaken(username.to_string()));
        }
        let user = User::new(username, email);
        let mut session = self.store.session();
        session.create_user(&user)?;
        session.commit()?;
        Ok(user)
    }

    /// Load a user or fail.
    pub fn get_user(&self, user_id: &str) -> Result<User, EngineError> {
        self.store
            .get_user(user_id)?
            .ok_or_else(|| EngineError::UserNotFound(user_id.to_string()))
    }

    /// Update a user's profile text.
    pub fn update_about_me(&self, user_id: &str, about_me: &str) -> Result<User, EngineError> {
        let mut user = self.get_user(user_id)?;
        user.about_me = Some(about_me.to_string());
        let mut session = self.store.session();
        session.update_user(&user)?;
        session.commit()?;
        Ok(user)
    }

    // ==================== Posts ====================

    /// Publish a new post. The commit hooks index it if search is enabled.
    pub fn publish_post(
        &self,
        user_id: &str,
        body: &str,
        language: Option<&str>,
    ) -> Result<Post, EngineError> {
        self.get_user(user_id)?;
        let mut post = Post::new(user_id, body);
        if let Some(language) = language {
            post = post.with_language(language);
        }
        let mut session = self.store.session();
        session.create_post(&post)?;
        session.commit()?;
        Ok(post)
    }

    /// Edit a post's body. The index picks up the current field values.
    pub fn edit_post(&self, post_id: &str, body: &str) -> Result<Post, EngineError> {
        let mut post = self.get_post(post_id)?;
        post.body = body.to_string();
        post.updated_at = Utc::now();
        let mut session = self.store.session();
        session.update_post(&post)?;
        session.commit()?;
        Ok(post)
    }

    /// Delete a post; the index entry goes with it.
    pub fn delete_post(&self, post_id: &str) -> Result<(), EngineError> {
        let post = self.get_post(post_id)?;
        let mut session = self.store.session();
        session.delete_post(&post)?;
        session.commit()?;
        Ok(())
    }

    /// Load a post or fail.
    pub fn get_post(&self, post_id: &str) -> Result<Post, EngineError> {
        self.store
            .get_post(post_id)?
            .ok_or_else(|| EngineError::PostNotFound(post_id.to_string()))
    }

    /// Ranked full-text search over posts.
    ///
    /// Queries the index first; a zero total short-circuits without
    /// touching the primary store. Otherwise posts are fetched by id in the
    /// order the index ranked them.
    pub fn search_posts(
        &self,
        expression: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Paginated<Post>, EngineError> {
        let stack = self.search_stack()?;
        stack.searcher.reload()?;

        let result = stack
            .searcher
            .query(Post::COLLECTION, expression, page, per_page)?;
        if result.total == 0 {
            return Ok(Paginated::empty(page, per_page));
        }

        let mut items = Vec::with_capacity(result.ids.len());
        for id in &result.ids {
            match self.store.get_post(id)? {
                Some(post) => items.push(post),
                None => warn!(post_id = %id, "Indexed post missing from store"),
            }
        }

        Ok(Paginated {
            items,
            total: result.total,
            page: page.max(1),
            per_page,
        })
    }

    /// Rebuild the post index from the primary store.
    pub fn rebuild_index(&self) -> Result<RebuildStats, EngineError> {
        let stack = self.search_stack()?;
        let stats = rebuild_posts(&self.store, &stack.writer)?;
        stack.searcher.reload()?;
        Ok(stats)
    }

    // ==================== Follow graph & feeds ====================

    /// Follow another user. Idempotent; self-follows are rejected.
    pub fn follow(&self, follower_id: &str, followed_id: &str) -> Result<(), EngineError> {
        if follower_id == followed_id {
            return Err(EngineError::SelfFollow);
        }
        self.get_user(follower_id)?;
        self.get_user(followed_id)?;
        let mut session = self.store.session();
        session.follow(follower_id, followed_id)?;
        session.commit()?;
        Ok(())
    }

    /// Stop following another user. Idempotent.
    pub fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<(), EngineError> {
        let mut session = self.store.session();
        session.unfollow(follower_id, followed_id)?;
        session.commit()?;
        Ok(())
    }

    /// True if `follower_id` follows `followed_id`.
    pub fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool, EngineError> {
        Ok(self.store.is_following(follower_id, followed_id)?)
    }

    /// Home feed: own posts plus followed users' posts, strictly ordered by
    /// creation time descending.
    pub fn following_posts(
        &self,
        user_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Paginated<Post>, EngineError> {
        let mut authors = self.store.following_ids(user_id)?;
        authors.push(user_id.to_string());

        let mut posts = Vec::new();
        for author in &authors {
            posts.extend(self.store.posts_by_user(author)?);
        }
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.post_id.cmp(&a.post_id))
        });

        Ok(Paginated::from_all(posts, page, per_page))
    }

    /// One author's posts, creation time descending.
    pub fn user_posts(
        &self,
        user_id: &str,
        page: usize,
        per_page: usize,
    ) -> Result<Paginated<Post>, EngineError> {
        let mut posts = self.store.posts_by_user(user_id)?;
        posts.reverse();
        Ok(Paginated::from_all(posts, page, per_page))
    }

    /// Every post from every author, creation time descending.
    pub fn explore(&self, page: usize, per_page: usize) -> Result<Paginated<Post>, EngineError> {
        let mut posts = self.store.all_posts()?;
        posts.reverse();
        Ok(Paginated::from_all(posts, page, per_page))
    }

    // ==================== Messages ====================

    /// Send a private message and refresh the recipient's unread counter
    /// notification.
    pub fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        body: &str,
    ) -> Result<Message, EngineError> {
        self.get_user(sender_id)?;
        let recipient = self.get_user(recipient_id)?;

        let message = Message::new(sender_id, recipient_id, body);
        let mut session = self.store.session();
        session.create_message(&message)?;
        session.commit()?;

        let unread = self
            .store
            .unread_message_count(recipient_id, recipient.messages_last_read)?;
        let mut session = self.store.session();
        session.add_notification(recipient_id, CHANNEL_UNREAD_MESSAGES, json!(unread))?;
        session.commit()?;

        Ok(message)
    }

    /// Mark a user's inbox read and zero the unread counter notification.
    pub fn mark_messages_read(&self, user_id: &str) -> Result<(), EngineError> {
        let mut user = self.get_user(user_id)?;
        user.messages_last_read = Some(Utc::now());
        let mut session = self.store.session();
        session.update_user(&user)?;
        session.add_notification(user_id, CHANNEL_UNREAD_MESSAGES, json!(0))?;
        session.commit()?;
        Ok(())
    }

    /// Count messages received since the user's last read mark.
    pub fn unread_message_count(&self, user_id: &str) -> Result<usize, EngineError> {
        let user = self.get_user(user_id)?;
        Ok(self
            .store
            .unread_message_count(user_id, user.messages_last_read)?)
    }

    /// A user's inbox, creation time ascending.
    pub fn inbox(&self, user_id: &str) -> Result<Vec<Message>, EngineError> {
        Ok(self.store.messages_for(user_id)?)
    }

    // ==================== Notifications ====================

    /// Notifications created strictly after `since_ms`, ascending.
    pub fn notifications_since(
        &self,
        user_id: &str,
        since_ms: i64,
    ) -> Result<Vec<Notification>, EngineError> {
        Ok(self.store.notifications_since(user_id, since_ms)?)
    }

    // ==================== Background tasks ====================

    /// Enqueue a named job and create its progress record.
    ///
    /// Enqueue failure surfaces before any record exists. Record creation
    /// failure after a successful enqueue leaves an orphaned job: it still
    /// runs, just without user-visible progress.
    pub fn launch_task(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
    ) -> Result<TaskRecord, EngineError> {
        self.get_user(user_id)?;
        let in_progress = self.store.tasks_in_progress(user_id)?;
        if in_progress.iter().any(|t| t.name == name) {
            return Err(EngineError::TaskAlreadyRunning(name.to_string()));
        }

        let handle = self.queue.enqueue(name, user_id, json!({}))?;

        let record = TaskRecord::new(handle.id(), user_id, name, description);
        let mut session = self.store.session();
        session.create_task(&record)?;
        session.commit()?;
        Ok(record)
    }

    /// Launch the canonical post export job for a user.
    pub fn launch_export(&self, user_id: &str) -> Result<TaskRecord, EngineError> {
        self.launch_task(user_id, EXPORT_POSTS, "Exporting posts...")
    }

    /// Incomplete tasks owned by a user.
    pub fn tasks_in_progress(&self, user_id: &str) -> Result<Vec<TaskRecord>, EngineError> {
        Ok(self.store.tasks_in_progress(user_id)?)
    }

    /// Progress view for one task.
    ///
    /// An unknown task id reports 100% / complete: an unresolvable job
    /// cannot meaningfully be "in progress".
    pub fn task_progress(&self, task_id: &str) -> Result<TaskProgress, EngineError> {
        match self.store.get_task(task_id)? {
            Some(record) => {
                let progress = if record.complete {
                    100
                } else {
                    self.registry.progress_of(task_id)
                };
                Ok(TaskProgress {
                    task_id: record.task_id,
                    progress,
                    complete: record.complete,
                })
            }
            None => Ok(TaskProgress {
                task_id: task_id.to_string(),
                progress: 100,
                complete: true,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_tasks::MemoryMailer;
    use tempfile::TempDir;

    fn open_engine(search: bool) -> (TempDir, Engine) {
        let temp = TempDir::new().unwrap();
        let mut config = ChirpConfig::new(temp.path().join("store"));
        if search {
            config = config.with_search_index(temp.path().join("index"));
        }
        let engine = Engine::open(config, Arc::new(MemoryMailer::new())).unwrap();
        (temp, engine)
    }

    #[test]
    fn test_create_user_rejects_duplicate_username() {
        let (_temp, engine) = open_engine(false);
        engine.create_user("susan", "susan@example.com").unwrap();

        let result = engine.create_user("susan", "other@example.com");
        assert!(matches!(result, Err(EngineError::UsernameTaken(_))));
    }

    #[test]
    fn test_publish_then_search() {
        let (_temp, engine) = open_engine(true);
        let user = engine.create_user("susan", "susan@example.com").unwrap();
        let post = engine
            .publish_post(&user.user_id, "hello world", Some("en"))
            .unwrap();

        let page = engine.search_posts("hello", 1, 10).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].post_id, post.post_id);

        let miss = engine.search_posts("xyz", 1, 10).unwrap();
        assert_eq!(miss.total, 0);
        assert!(miss.items.is_empty());
    }

    #[test]
    fn test_edit_post_reindexes() {
        let (_temp, engine) = open_engine(true);
        let user = engine.create_user("susan", "susan@example.com").unwrap();
        let post = engine
            .publish_post(&user.user_id, "original words", None)
            .unwrap();

        engine.edit_post(&post.post_id, "revised words").unwrap();

        assert_eq!(engine.search_posts("revised", 1, 10).unwrap().total, 1);
        assert_eq!(engine.search_posts("original", 1, 10).unwrap().total, 0);
    }

    #[test]
    fn test_delete_post_leaves_search() {
        let (_temp, engine) = open_engine(true);
        let user = engine.create_user("susan", "susan@example.com").unwrap();
        let post = engine
            .publish_post(&user.user_id, "ephemeral content", None)
            .unwrap();

        assert_eq!(engine.search_posts("ephemeral", 1, 10).unwrap().total, 1);
        engine.delete_post(&post.post_id).unwrap();
        assert_eq!(engine.search_posts("ephemeral", 1, 10).unwrap().total, 0);
    }

    #[test]
    fn test_search_disabled_is_an_error() {
        let (_temp, engine) = open_engine(false);
        assert!(!engine.search_enabled());
        assert!(matches!(
            engine.search_posts("anything", 1, 10),
            Err(EngineError::SearchDisabled)
        ));
        assert!(matches!(
            engine.rebuild_index(),
            Err(EngineError::SearchDisabled)
        ));
    }

    #[test]
    fn test_indexing_disabled_does_not_block_writes() {
        let (_temp, engine) = open_engine(false);
        let user = engine.create_user("susan", "susan@example.com").unwrap();
        let post = engine
            .publish_post(&user.user_id, "unindexed but stored", None)
            .unwrap();
        assert_eq!(engine.get_post(&post.post_id).unwrap().body, post.body);
    }

    #[test]
    fn test_self_follow_rejected() {
        let (_temp, engine) = open_engine(false);
        let user = engine.create_user("susan", "susan@example.com").unwrap();
        assert!(matches!(
            engine.follow(&user.user_id, &user.user_id),
            Err(EngineError::SelfFollow)
        ));
    }

    #[test]
    fn test_unread_counter_notification() {
        let (_temp, engine) = open_engine(false);
        let sender = engine.create_user("sender", "s@example.com").unwrap();
        let reader = engine.create_user("reader", "r@example.com").unwrap();

        engine
            .send_message(&sender.user_id, &reader.user_id, "one")
            .unwrap();
        engine
            .send_message(&sender.user_id, &reader.user_id, "two")
            .unwrap();

        assert_eq!(engine.unread_message_count(&reader.user_id).unwrap(), 2);
        let notifications = engine.notifications_since(&reader.user_id, 0).unwrap();
        let counters: Vec<_> = notifications
            .iter()
            .filter(|n| n.name == CHANNEL_UNREAD_MESSAGES)
            .collect();
        // Singleton channel: only the latest counter value survives.
        assert_eq!(counters.len(), 1);
        assert_eq!(counters[0].payload, json!(2));

        engine.mark_messages_read(&reader.user_id).unwrap();
        assert_eq!(engine.unread_message_count(&reader.user_id).unwrap(), 0);
        let notifications = engine.notifications_since(&reader.user_id, 0).unwrap();
        let counters: Vec<_> = notifications
            .iter()
            .filter(|n| n.name == CHANNEL_UNREAD_MESSAGES)
            .collect();
        assert_eq!(counters[0].payload, json!(0));
    }

    #[tokio::test]
    async fn test_duplicate_task_rejected() {
        let (_temp, engine) = open_engine(false);
        let user = engine.create_user("susan", "susan@example.com").unwrap();

        // No worker started: the first task stays in progress.
        engine.launch_export(&user.user_id).unwrap();
        assert!(matches!(
            engine.launch_export(&user.user_id),
            Err(EngineError::TaskAlreadyRunning(_))
        ));
    }

    #[test]
    fn test_unknown_task_polls_as_complete() {
        let (_temp, engine) = open_engine(false);
        let progress = engine.task_progress("no-such-job").unwrap();
        assert_eq!(progress.progress, 100);
        assert!(progress.complete);
    }
}
