//! # chirp-indexing
//!
//! Keeps the search index consistent with the primary store.
//!
//! The [`IndexSynchronizer`] is a post-commit hook: after a store session
//! commits, it replays the captured change-set against the search backend.
//! Indexing is best-effort relative to the primary store; a failed index
//! write is logged and recovered later via [`rebuild::rebuild_posts`],
//! never surfaced to the committer.

pub mod error;
pub mod rebuild;
pub mod sync;

pub use error::IndexingError;
pub use rebuild::{rebuild_posts, RebuildStats};
pub use sync::IndexSynchronizer;
