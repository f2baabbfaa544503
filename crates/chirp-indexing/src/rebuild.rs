//! Full index rebuild from the primary store.
//!
//! Clears a collection and re-adds every entity, confirming the index is a
//! derived cache. Used for recovery after index loss or drift (e.g. after a
//! run of failed best-effort updates).

use tracing::{info, warn};

use chirp_search::SearchWriter;
use chirp_storage::Store;
use chirp_types::{Post, Searchable};

use crate::error::IndexingError;

/// Statistics from a rebuild run.
#[derive(Debug, Clone, Default)]
pub struct RebuildStats {
    /// Documents successfully re-added
    pub indexed: u64,
    /// Documents that failed to index
    pub errors: u64,
    /// Whether the rebuild ran to completion and committed
    pub completed: bool,
}

impl RebuildStats {
    /// Create a new stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful document.
    pub fn record_indexed(&mut self) {
        self.indexed += 1;
    }

    /// Record a failed document.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    /// Mark the rebuild as completed.
    pub fn mark_completed(&mut self) {
        self.completed = true;
    }
}

/// Rebuild the post collection from the primary store.
///
/// Clears every indexed post, then re-adds all posts in storage. Individual
/// document failures are logged and counted; a failure to clear or commit
/// aborts the rebuild.
pub fn rebuild_posts(store: &Store, writer: &SearchWriter) -> Result<RebuildStats, IndexingError> {
    let mut stats = RebuildStats::new();

    info!("Starting post index rebuild");
    writer.clear_collection(Post::COLLECTION)?;

    let posts = store.all_posts()?;
    info!(count = posts.len(), "Found posts to index");

    for post in &posts {
        let fields = post.searchable_fields();
        match writer.upsert(Post::COLLECTION, &post.post_id, &fields) {
            Ok(()) => stats.record_indexed(),
            Err(e) => {
                warn!(post_id = %post.post_id, error = %e, "Failed to index post");
                stats.record_error();
            }
        }
    }

    writer.commit()?;
    stats.mark_completed();

    info!(
        indexed = stats.indexed,
        errors = stats.errors,
        "Post index rebuild complete"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp_search::{EntitySearcher, SearchIndex, SearchIndexConfig};
    use tempfile::TempDir;

    fn setup() -> (TempDir, Store, SearchIndex) {
        let temp = TempDir::new().unwrap();
        let store = Store::open(&temp.path().join("store")).unwrap();
        let config = SearchIndexConfig::new(temp.path().join("index"));
        let index = SearchIndex::open_or_create(config).unwrap();
        (temp, store, index)
    }

    #[test]
    fn test_rebuild_from_empty_store() {
        let (_temp, store, index) = setup();
        let writer = SearchWriter::new(&index).unwrap();

        let stats = rebuild_posts(&store, &writer).unwrap();
        assert_eq!(stats.indexed, 0);
        assert_eq!(stats.errors, 0);
        assert!(stats.completed);
    }

    #[test]
    fn test_rebuild_recovers_missing_documents() {
        let (_temp, store, index) = setup();

        let post = Post::new("user-1", "recoverable content");
        let mut session = store.session();
        session.create_post(&post).unwrap();
        session.commit().unwrap();

        // The index never saw the post (no synchronizer registered).
        let writer = SearchWriter::new(&index).unwrap();
        let stats = rebuild_posts(&store, &writer).unwrap();
        assert_eq!(stats.indexed, 1);

        let searcher = EntitySearcher::new(&index).unwrap();
        let page = searcher.query("post", "recoverable", 1, 10).unwrap();
        assert_eq!(page.ids, vec![post.post_id]);
    }

    #[test]
    fn test_rebuild_drops_stale_documents() {
        let (_temp, store, index) = setup();
        let writer = SearchWriter::new(&index).unwrap();

        // Drift: a document for a post the store no longer has.
        writer
            .upsert("post", "ghost-id", &[("body", "ghost content".to_string())])
            .unwrap();
        writer.commit().unwrap();

        let stats = rebuild_posts(&store, &writer).unwrap();
        assert!(stats.completed);

        let searcher = EntitySearcher::new(&index).unwrap();
        assert_eq!(searcher.query("post", "ghost", 1, 10).unwrap().total, 0);
    }
}
