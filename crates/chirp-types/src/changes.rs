//! Per-transaction change-set.
//!
//! A [`ChangeSet`] is a transient snapshot of the entities touched by one
//! unit of work, materialized immediately before commit and consumed exactly
//! once by post-commit hooks. It is never persisted.

use std::sync::Arc;

use crate::entity::Entity;

/// Snapshot of entities added, updated and deleted within one transaction.
///
/// The three lists are disjoint and preserve insertion order.
#[derive(Default)]
pub struct ChangeSet {
    /// Entities newly created in this transaction
    pub added: Vec<Arc<dyn Entity>>,
    /// Entities modified in this transaction
    pub updated: Vec<Arc<dyn Entity>>,
    /// Entities deleted in this transaction
    pub deleted: Vec<Arc<dyn Entity>>,
}

impl ChangeSet {
    /// Create an empty change-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly created entity.
    pub fn record_added(&mut self, entity: Arc<dyn Entity>) {
        self.added.push(entity);
    }

    /// Record a modified entity.
    pub fn record_updated(&mut self, entity: Arc<dyn Entity>) {
        self.updated.push(entity);
    }

    /// Record a deleted entity.
    pub fn record_deleted(&mut self, entity: Arc<dyn Entity>) {
        self.deleted.push(entity);
    }

    /// True if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    /// Total number of captured entities across all three lists.
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.deleted.len()
    }
}

impl std::fmt::Debug for ChangeSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSet")
            .field("added", &self.added.len())
            .field("updated", &self.updated.len())
            .field("deleted", &self.deleted.len())
            .finish()
    }
}
