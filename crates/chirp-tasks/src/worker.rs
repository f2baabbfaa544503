//! Queue consumer with guaranteed finalization.
//!
//! The worker drains the queue channel one job at a time. Each routine body
//! runs in its own spawned task so that error returns and panics are both
//! captured; finalization then runs on every exit path: progress is forced
//! to 100, the task record's completion flag is set, and a final progress
//! notification goes out. A crash can delay completion but never leave a
//! task permanently "in progress".

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use chirp_storage::Store;
use chirp_types::notification::CHANNEL_TASK_PROGRESS;

use crate::context::JobContext;
use crate::error::TaskError;
use crate::mailer::Mailer;
use crate::queue::QueuedJob;
use crate::registry::JobRegistry;

/// Boxed future returned by job routines.
pub type RoutineFuture = Pin<Box<dyn Future<Output = Result<(), TaskError>> + Send>>;

/// A registered job routine.
pub type JobRoutine = Arc<dyn Fn(JobContext, Value) -> RoutineFuture + Send + Sync>;

/// Name -> routine table consulted by the worker.
#[derive(Default)]
pub struct JobTable {
    routines: HashMap<String, JobRoutine>,
}

impl JobTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a routine under a name. Re-registering replaces.
    pub fn register<F, Fut>(&mut self, name: impl Into<String>, routine: F)
    where
        F: Fn(JobContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.routines.insert(
            name.into(),
            Arc::new(move |ctx, args| Box::pin(routine(ctx, args))),
        );
    }

    /// Look up a routine by name.
    pub fn get(&self, name: &str) -> Option<JobRoutine> {
        self.routines.get(name).cloned()
    }

    /// Registered routine names.
    pub fn names(&self) -> Vec<&str> {
        self.routines.keys().map(|s| s.as_str()).collect()
    }
}

/// Background worker consuming the task queue.
pub struct Worker {
    rx: mpsc::UnboundedReceiver<QueuedJob>,
    table: JobTable,
    store: Arc<Store>,
    registry: Arc<JobRegistry>,
    mailer: Arc<dyn Mailer>,
    notify_progress: bool,
}

impl Worker {
    /// Create a worker over a queue receiver.
    pub fn new(
        rx: mpsc::UnboundedReceiver<QueuedJob>,
        table: JobTable,
        store: Arc<Store>,
        registry: Arc<JobRegistry>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            rx,
            table,
            store,
            registry,
            mailer,
            notify_progress: true,
        }
    }

    /// Enable or disable per-progress notifications.
    pub fn with_progress_notifications(mut self, enabled: bool) -> Self {
        self.notify_progress = enabled;
        self
    }

    /// Drain the queue until every sender is dropped.
    pub async fn run(mut self) {
        info!(routines = ?self.table.names(), "Worker started");
        while let Some(job) = self.rx.recv().await {
            self.execute(job).await;
        }
        info!("Worker stopped");
    }

    async fn execute(&self, job: QueuedJob) {
        info!(job_id = %job.job_id, name = %job.name, "Job started");
        self.registry.record_running(&job.job_id);

        let succeeded = match self.table.get(&job.name) {
            Some(routine) => {
                let ctx = JobContext::new(
                    job.job_id.clone(),
                    job.user_id.clone(),
                    self.store.clone(),
                    self.registry.clone(),
                    self.mailer.clone(),
                    self.notify_progress,
                );
                // Spawned so a panicking routine surfaces as a JoinError
                // instead of taking the worker down.
                match tokio::spawn(routine(ctx, job.args.clone())).await {
                    Ok(Ok(())) => true,
                    Ok(Err(e)) => {
                        error!(job_id = %job.job_id, name = %job.name, error = %e, "Job failed");
                        false
                    }
                    Err(join_err) => {
                        error!(
                            job_id = %job.job_id,
                            name = %job.name,
                            error = %join_err,
                            "Job panicked"
                        );
                        false
                    }
                }
            }
            None => {
                error!(job_id = %job.job_id, name = %job.name, "Unknown job routine");
                false
            }
        };

        self.registry.record_outcome(&job.job_id, succeeded);
        self.finalize(&job);
        info!(job_id = %job.job_id, succeeded, "Job finalized");
    }

    /// Terminal step, runs on success and failure alike: progress 100,
    /// completion flag set, final notification. Failures in here are logged
    /// and swallowed so finalization of one piece never blocks the rest.
    fn finalize(&self, job: &QueuedJob) {
        self.registry.finalize(&job.job_id);

        match self.store.get_task(&job.job_id) {
            Ok(Some(mut record)) => {
                record.complete = true;
                let mut session = self.store.session();
                let staged = session.update_task(&record).and_then(|_| {
                    session
                        .add_notification(
                            &job.user_id,
                            CHANNEL_TASK_PROGRESS,
                            json!({ "task_id": job.job_id, "progress": 100 }),
                        )
                        .map(|_| ())
                });
                let committed = staged.and_then(|_| session.commit());
                if let Err(e) = committed {
                    warn!(job_id = %job.job_id, error = %e, "Failed to finalize task record");
                }
            }
            Ok(None) => {
                // Orphaned job: enqueued but record creation failed.
                debug!(job_id = %job.job_id, "No task record to finalize");
            }
            Err(e) => {
                warn!(job_id = %job.job_id, error = %e, "Failed to load task record");
            }
        }
    }
}
