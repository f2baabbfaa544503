//! # chirp-engine
//!
//! Facade wiring the chirp subsystems together: the primary store, the
//! search index with its commit-time synchronizer, and the background task
//! pipeline. Connections are constructed once in [`Engine::open`] and passed
//! explicitly; there is no ambient global state.
//!
//! The engine exposes the operations the web layer calls: publishing and
//! searching posts, the follow graph and home feed, private messages with
//! unread counters, notification polling, and launching/tracking background
//! tasks.

pub mod engine;
pub mod error;
pub mod pagination;

pub use engine::{Engine, TaskProgress};
pub use error::EngineError;
pub use pagination::Paginated;
