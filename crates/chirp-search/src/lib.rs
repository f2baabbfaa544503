//! # chirp-search
//!
//! Full-text search for chirp using Tantivy.
//!
//! This crate is the thin adapter over the search backend:
//! - Embedded Tantivy index with MmapDirectory for persistence
//! - Idempotent document upsert/remove keyed by `(collection, id)`
//! - BM25-ranked queries with 1-indexed pagination returning
//!   `(ids, total_count)`
//!
//! The index is a derived, rebuildable view of the primary store; it is
//! never a source of truth.

pub mod error;
pub mod index;
pub mod schema;
pub mod searcher;
pub mod writer;

pub use error::SearchError;
pub use index::{open_or_create_index, SearchIndex, SearchIndexConfig};
pub use schema::{build_search_schema, SearchSchema};
pub use searcher::{EntitySearcher, QueryPage};
pub use writer::SearchWriter;
