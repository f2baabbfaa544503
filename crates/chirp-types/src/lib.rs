//! # chirp-types
//!
//! Shared domain types for the chirp blogging engine.
//!
//! This crate defines the core data structures used throughout the system:
//! - Users, posts, private messages
//! - Notifications delivered to the web layer
//! - Task records correlating queue jobs with user-visible status
//! - The `Entity` / `Searchable` capability contracts
//! - Per-transaction change-sets consumed by the index synchronizer

pub mod changes;
pub mod config;
pub mod entity;
pub mod error;
pub mod message;
pub mod notification;
pub mod post;
pub mod task;
pub mod user;

pub use changes::ChangeSet;
pub use config::ChirpConfig;
pub use entity::{Entity, Searchable};
pub use error::CoreError;
pub use message::Message;
pub use notification::Notification;
pub use post::Post;
pub use task::TaskRecord;
pub use user::User;
