//! Task queue client.
//!
//! `enqueue` durably hands a named job to the worker channel and returns a
//! [`JobHandle`] whose id correlates the queue-side job with the caller's
//! task progress record. Creating that record is the caller's
//! responsibility; if record creation fails after a successful enqueue the
//! job still runs, just without user-visible progress.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::error::TaskError;
use crate::registry::JobRegistry;

/// A job message on the queue.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    /// Globally unique job id assigned at enqueue time
    pub job_id: String,
    /// Routine name to execute
    pub name: String,
    /// Owning user
    pub user_id: String,
    /// Routine arguments
    pub args: Value,
}

/// Handle to an enqueued job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: String,
}

impl JobHandle {
    /// The queue-assigned job id.
    pub fn id(&self) -> &str {
        &self.job_id
    }
}

/// Client side of the task queue.
#[derive(Clone)]
pub struct TaskQueue {
    tx: mpsc::UnboundedSender<QueuedJob>,
    registry: Arc<JobRegistry>,
}

impl TaskQueue {
    /// Create a queue and the receiver a [`crate::Worker`] will drain.
    pub fn new(registry: Arc<JobRegistry>) -> (Self, mpsc::UnboundedReceiver<QueuedJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, registry }, rx)
    }

    /// Enqueue a named job for a user.
    ///
    /// On failure nothing is registered and the error surfaces to the
    /// caller, who then must not create a task record.
    pub fn enqueue(
        &self,
        name: &str,
        user_id: &str,
        args: Value,
    ) -> Result<JobHandle, TaskError> {
        let job_id = uuid::Uuid::new_v4().to_string();
        self.registry.register(&job_id, name, user_id);

        let job = QueuedJob {
            job_id: job_id.clone(),
            name: name.to_string(),
            user_id: user_id.to_string(),
            args,
        };

        if self.tx.send(job).is_err() {
            self.registry.unregister(&job_id);
            return Err(TaskError::QueueClosed);
        }

        info!(job_id = %job_id, name, user_id, "Enqueued job");
        Ok(JobHandle { job_id })
    }
}
