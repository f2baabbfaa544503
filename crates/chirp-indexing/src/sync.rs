//! Post-commit index synchronization.
//!
//! Replays a committed change-set against the search backend: added and
//! updated entities that expose the searchable capability are upserted with
//! their current field values; deleted ones are removed by id. Entities
//! without the capability are skipped.
//!
//! The primary write already succeeded when this runs, so failures here are
//! logged and swallowed; the index is repaired by a later rebuild.

use std::sync::Arc;

use tracing::{debug, warn};

use chirp_search::SearchWriter;
use chirp_storage::CommitHook;
use chirp_types::{ChangeSet, Entity, Searchable};

/// Commit hook that mirrors change-sets into the search index.
pub struct IndexSynchronizer {
    writer: Arc<SearchWriter>,
}

impl IndexSynchronizer {
    /// Create a synchronizer over the given index writer.
    pub fn new(writer: Arc<SearchWriter>) -> Self {
        Self { writer }
    }
}

impl CommitHook for IndexSynchronizer {
    fn after_commit(&self, changes: &ChangeSet) {
        if changes.is_empty() {
            return;
        }

        let mut touched = 0usize;

        for entity in changes.added.iter().chain(changes.updated.iter()) {
            let Some(searchable) = entity.as_searchable() else {
                continue;
            };
            let fields = searchable.searchable_fields();
            match self
                .writer
                .upsert(entity.collection(), &entity.entity_id(), &fields)
            {
                Ok(()) => touched += 1,
                Err(e) => warn!(
                    collection = entity.collection(),
                    id = %entity.entity_id(),
                    error = %e,
                    "Failed to upsert into search index"
                ),
            }
        }

        for entity in &changes.deleted {
            if entity.as_searchable().is_none() {
                continue;
            }
            match self.writer.remove(entity.collection(), &entity.entity_id()) {
                Ok(()) => touched += 1,
                Err(e) => warn!(
                    collection = entity.collection(),
                    id = %entity.entity_id(),
                    error = %e,
                    "Failed to remove from search index"
                ),
            }
        }

        if touched == 0 {
            return;
        }

        match self.writer.commit() {
            Ok(_) => debug!(touched, "Search index synchronized"),
            Err(e) => warn!(error = %e, "Failed to commit search index changes"),
        }
    }
}
