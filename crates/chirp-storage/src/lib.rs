//! # chirp-storage
//!
//! RocksDB-backed primary store for the chirp engine.
//!
//! This crate provides:
//! - Database open/close with column family setup per record kind
//! - A [`Session`] unit of work staging writes into an atomic batch
//! - Change tracking: every session materializes a [`chirp_types::ChangeSet`]
//!   at commit time and runs registered pre/post-commit hooks around the
//!   atomic write
//! - Typed reads: single-key lookups and time-ordered prefix scans

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod session;

pub use db::Store;
pub use error::StorageError;
pub use session::{CommitHook, Session};
