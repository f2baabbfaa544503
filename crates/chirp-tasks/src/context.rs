//! Per-job execution context handed to routines.
//!
//! A routine reports fractional progress through its context. Each distinct
//! percentage is persisted to the job registry inside one transactional
//! update and mirrored to the owning user as a `task_progress` notification;
//! repeated reports of the same value are dropped so large item counts do
//! not flood the notification channel.

use std::sync::atomic::{AtomicI16, Ordering};
use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use chirp_storage::Store;
use chirp_types::notification::CHANNEL_TASK_PROGRESS;

use crate::error::TaskError;
use crate::mailer::Mailer;
use crate::registry::JobRegistry;

/// Execution context for one job run.
pub struct JobContext {
    job_id: String,
    user_id: String,
    store: Arc<Store>,
    registry: Arc<JobRegistry>,
    mailer: Arc<dyn Mailer>,
    notify_progress: bool,
    last_reported: AtomicI16,
}

impl JobContext {
    /// Create a context for a job run.
    pub fn new(
        job_id: String,
        user_id: String,
        store: Arc<Store>,
        registry: Arc<JobRegistry>,
        mailer: Arc<dyn Mailer>,
        notify_progress: bool,
    ) -> Self {
        Self {
            job_id,
            user_id,
            store,
            registry,
            mailer,
            notify_progress,
            last_reported: AtomicI16::new(-1),
        }
    }

    /// The queue job id.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// The owning user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// The primary store.
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// The outbound delivery surface.
    pub fn mailer(&self) -> &Arc<dyn Mailer> {
        &self.mailer
    }

    /// Report fractional progress, clamped to 0..=100.
    ///
    /// Repeating the previously reported value is a no-op.
    pub fn report_progress(&self, percent: u8) -> Result<(), TaskError> {
        let percent = percent.min(100);
        if self.last_reported.swap(percent as i16, Ordering::SeqCst) == percent as i16 {
            return Ok(());
        }

        self.registry.record_progress(&self.job_id, percent);

        if self.notify_progress {
            let mut session = self.store.session();
            session.add_notification(
                &self.user_id,
                CHANNEL_TASK_PROGRESS,
                json!({ "task_id": self.job_id, "progress": percent }),
            )?;
            session.commit()?;
        }

        debug!(job_id = %self.job_id, percent, "Progress reported");
        Ok(())
    }
}
