//! Built-in job routines.

pub mod export;

pub use export::{export_posts, EXPORT_POSTS};

use crate::worker::JobTable;

/// Register every built-in routine on a job table.
pub fn register_builtin_jobs(table: &mut JobTable) {
    table.register(EXPORT_POSTS, export_posts);
}
