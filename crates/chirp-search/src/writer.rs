//! Index writer wrapper for document upserts and removals.
//!
//! Wraps IndexWriter with shared access via Arc<Mutex>. Staged operations
//! are not visible until commit() is called. Upsert and remove are both
//! idempotent: removing an absent document is a no-op and upserting twice
//! leaves one live document.

use std::sync::{Arc, Mutex};

use tantivy::{doc, IndexWriter, Term};
use tracing::{debug, info, warn};

use crate::error::SearchError;
use crate::index::SearchIndex;
use crate::schema::SearchSchema;

/// Manages document write operations against the search index.
pub struct SearchWriter {
    writer: Arc<Mutex<IndexWriter>>,
    schema: SearchSchema,
}

impl SearchWriter {
    /// Create a new writer from a SearchIndex.
    pub fn new(index: &SearchIndex) -> Result<Self, SearchError> {
        let writer = index.writer()?;
        let schema = index.schema().clone();

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            schema,
        })
    }

    /// Upsert a document.
    ///
    /// Any existing document with the same `(collection, id)` is replaced.
    /// Field values are joined into the single searchable text field.
    pub fn upsert(
        &self,
        collection: &str,
        id: &str,
        fields: &[(&str, String)],
    ) -> Result<(), SearchError> {
        let key = SearchSchema::key_value(collection, id);
        let text = fields
            .iter()
            .map(|(_, value)| value.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        writer.delete_term(Term::from_field_text(self.schema.key, &key));
        writer.add_document(doc!(
            self.schema.key => key,
            self.schema.collection => collection,
            self.schema.doc_id => id,
            self.schema.text => text,
        ))?;

        debug!(collection, id, "Upserted document");
        Ok(())
    }

    /// Remove a document by `(collection, id)`.
    ///
    /// Removing an id that is not indexed is not an error.
    pub fn remove(&self, collection: &str, id: &str) -> Result<(), SearchError> {
        let key = SearchSchema::key_value(collection, id);

        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        writer.delete_term(Term::from_field_text(self.schema.key, &key));

        debug!(collection, id, "Removed document");
        Ok(())
    }

    /// Delete every document in a collection. Used by full rebuilds.
    pub fn clear_collection(&self, collection: &str) -> Result<(), SearchError> {
        let writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        writer.delete_term(Term::from_field_text(self.schema.collection, collection));

        warn!(collection, "Cleared collection from index");
        Ok(())
    }

    /// Commit pending changes to make them searchable.
    ///
    /// This is expensive - batch document operations and commit once per
    /// change-set.
    pub fn commit(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.commit()?;
        info!(opstamp, "Committed index changes");
        Ok(opstamp)
    }

    /// Rollback uncommitted changes.
    pub fn rollback(&self) -> Result<u64, SearchError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))?;

        let opstamp = writer.rollback()?;
        warn!(opstamp, "Rolled back index changes");
        Ok(opstamp)
    }
}
