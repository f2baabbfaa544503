//! Column family definitions for RocksDB.
//!
//! Each column family isolates one record kind with its own access pattern:
//! - users: account records (point lookups)
//! - posts: post bodies under time-prefixed keys (feed scans)
//! - posts_by_user: per-author pointers to posts (profile scans)
//! - follows: follow edges (prefix scans per follower)
//! - messages: private messages keyed by recipient (inbox scans)
//! - notifications: per-user notification log (cursor scans)
//! - tasks: task progress records keyed by queue job id

use rocksdb::{ColumnFamilyDescriptor, Options};

/// Column family name for user records
pub const CF_USERS: &str = "users";

/// Column family name for posts
pub const CF_POSTS: &str = "posts";

/// Column family name for per-author post pointers
pub const CF_POSTS_BY_USER: &str = "posts_by_user";

/// Column family name for follow edges
pub const CF_FOLLOWS: &str = "follows";

/// Column family name for private messages
pub const CF_MESSAGES: &str = "messages";

/// Column family name for notifications
pub const CF_NOTIFICATIONS: &str = "notifications";

/// Column family name for task progress records
pub const CF_TASKS: &str = "tasks";

/// All column family names
pub const ALL_CF_NAMES: &[&str] = &[
    CF_USERS,
    CF_POSTS,
    CF_POSTS_BY_USER,
    CF_FOLLOWS,
    CF_MESSAGES,
    CF_NOTIFICATIONS,
    CF_TASKS,
];

/// Create column family options for post bodies (compressed)
fn posts_options() -> Options {
    let mut opts = Options::default();
    opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
    opts
}

/// Build all column family descriptors
pub fn build_cf_descriptors() -> Vec<ColumnFamilyDescriptor> {
    vec![
        ColumnFamilyDescriptor::new(CF_USERS, Options::default()),
        ColumnFamilyDescriptor::new(CF_POSTS, posts_options()),
        ColumnFamilyDescriptor::new(CF_POSTS_BY_USER, Options::default()),
        ColumnFamilyDescriptor::new(CF_FOLLOWS, Options::default()),
        ColumnFamilyDescriptor::new(CF_MESSAGES, Options::default()),
        ColumnFamilyDescriptor::new(CF_NOTIFICATIONS, Options::default()),
        ColumnFamilyDescriptor::new(CF_TASKS, Options::default()),
    ]
}
