//! Shared fixtures for end-to-end tests.
//!
//! Tests drive the assembled [`Engine`] the way the web layer would:
//! publish posts, search, follow, message, launch background tasks, and
//! poll progress.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use chirp_engine::{Engine, TaskProgress};
use chirp_tasks::MemoryMailer;
use chirp_types::ChirpConfig;

/// An engine over temporary directories plus the recording mailer.
pub struct TestApp {
    _temp: TempDir,
    pub engine: Engine,
    pub mailer: Arc<MemoryMailer>,
}

/// Build an engine with or without a search index.
pub fn spawn_app(search: bool) -> TestApp {
    // Ignore errors: another test may have installed the subscriber already.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let temp = TempDir::new().unwrap();
    let mut config = ChirpConfig::new(temp.path().join("store"));
    if search {
        config = config.with_search_index(temp.path().join("index"));
    }
    let mailer = Arc::new(MemoryMailer::new());
    let engine = Engine::open(config, mailer.clone()).unwrap();

    TestApp {
        _temp: temp,
        engine,
        mailer,
    }
}

/// Poll a task until its record reports complete, or panic after ~5s.
pub async fn wait_for_completion(engine: &Engine, task_id: &str) -> TaskProgress {
    for _ in 0..100 {
        let progress = engine.task_progress(task_id).unwrap();
        if progress.complete {
            return progress;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("task {} never completed", task_id);
}
