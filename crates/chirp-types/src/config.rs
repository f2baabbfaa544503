//! Configuration loading for chirp.
//!
//! Layered config: defaults -> optional config file -> environment
//! variables prefixed with `CHIRP`.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

fn default_data_dir() -> PathBuf {
    PathBuf::from("./chirp-data")
}

fn default_posts_per_page() -> usize {
    10
}

fn default_progress_notifications() -> bool {
    true
}

/// Top-level configuration for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChirpConfig {
    /// Directory for the primary store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for the search index. None disables indexing and search.
    #[serde(default)]
    pub search_index_path: Option<PathBuf>,

    /// Page size for post feeds and search results
    #[serde(default = "default_posts_per_page")]
    pub posts_per_page: usize,

    /// Whether workers emit per-progress notifications
    #[serde(default = "default_progress_notifications")]
    pub progress_notifications: bool,
}

impl Default for ChirpConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            search_index_path: None,
            posts_per_page: default_posts_per_page(),
            progress_notifications: default_progress_notifications(),
        }
    }
}

impl ChirpConfig {
    /// Create a config rooted at the given data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Enable search with an index at the given path.
    pub fn with_search_index(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_index_path = Some(path.into());
        self
    }

    /// Set the feed/search page size.
    pub fn with_posts_per_page(mut self, per_page: usize) -> Self {
        self.posts_per_page = per_page;
        self
    }

    /// True when a search index is configured.
    pub fn search_enabled(&self) -> bool {
        self.search_index_path.is_some()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.posts_per_page == 0 {
            return Err("posts_per_page must be > 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from an optional TOML file and the environment.
    ///
    /// Environment variables use the `CHIRP` prefix with `__` separators
    /// (e.g. `CHIRP__POSTS_PER_PAGE=25`).
    pub fn load(path: Option<&Path>) -> Result<Self, CoreError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let loaded = builder
            .add_source(Environment::with_prefix("CHIRP").separator("__"))
            .build()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        let cfg: ChirpConfig = loaded
            .try_deserialize()
            .map_err(|e| CoreError::Config(e.to_string()))?;
        cfg.validate().map_err(CoreError::Config)?;
        Ok(cfg)
    }
}
