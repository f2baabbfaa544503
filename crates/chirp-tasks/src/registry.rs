//! Job registry tracking execution state and progress.
//!
//! The registry is the queue-side metadata store: one entry per job id,
//! holding the lifecycle state, the latest progress percentage, and
//! arbitrary string metadata. Each update happens under a single lock
//! acquisition, so a concurrently polling reader always observes a
//! consistent snapshot, never a torn value.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a job.
///
/// Transitions: Pending -> Running -> (Succeeded | Failed) -> Finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Queued, not yet picked up by a worker
    Pending,
    /// A worker is executing the routine
    Running,
    /// The routine returned without error
    Succeeded,
    /// The routine returned an error or panicked
    Failed,
    /// Terminal: progress forced to 100, task record completed
    Finalized,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Pending => write!(f, "pending"),
            JobState::Running => write!(f, "running"),
            JobState::Succeeded => write!(f, "succeeded"),
            JobState::Failed => write!(f, "failed"),
            JobState::Finalized => write!(f, "finalized"),
        }
    }
}

/// Status of a registered job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Queue job id
    pub job_id: String,
    /// Routine name
    pub name: String,
    /// Owning user
    pub user_id: String,
    /// Current lifecycle state
    pub state: JobState,
    /// Latest reported progress, 0..=100
    pub progress: u8,
    /// Number of distinct progress values recorded
    pub progress_updates: u64,
    /// Arbitrary job metadata (e.g. outcome)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    /// When the job was enqueued
    pub enqueued_at: DateTime<Utc>,
    /// When the job finished (set with the outcome)
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobStatus {
    /// Create a fresh pending status.
    pub fn new(job_id: String, name: String, user_id: String) -> Self {
        Self {
            job_id,
            name,
            user_id,
            state: JobState::Pending,
            progress: 0,
            progress_updates: 0,
            metadata: HashMap::new(),
            enqueued_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Thread-safe registry of job statuses, keyed by job id.
///
/// An unknown job id reads as progress 100 / finished: an unresolvable job
/// cannot meaningfully be "in progress".
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl JobRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new pending job.
    pub fn register(&self, job_id: &str, name: &str, user_id: &str) {
        self.write().insert(
            job_id.to_string(),
            JobStatus::new(job_id.to_string(), name.to_string(), user_id.to_string()),
        );
    }

    /// Drop a job entry (used when an enqueue fails after registration).
    pub fn unregister(&self, job_id: &str) {
        self.write().remove(job_id);
    }

    /// Record that a worker picked the job up.
    pub fn record_running(&self, job_id: &str) {
        if let Some(status) = self.write().get_mut(job_id) {
            status.state = JobState::Running;
        }
    }

    /// Record a progress value, clamped to 0..=100.
    ///
    /// Duplicate values still overwrite but are counted once per distinct
    /// value via `progress_updates`.
    pub fn record_progress(&self, job_id: &str, percent: u8) {
        let percent = percent.min(100);
        if let Some(status) = self.write().get_mut(job_id) {
            if status.progress != percent || status.progress_updates == 0 {
                status.progress_updates += 1;
            }
            status.progress = percent;
        }
    }

    /// Record the routine outcome.
    pub fn record_outcome(&self, job_id: &str, succeeded: bool) {
        if let Some(status) = self.write().get_mut(job_id) {
            status.state = if succeeded {
                JobState::Succeeded
            } else {
                JobState::Failed
            };
            status.finished_at = Some(Utc::now());
            status.metadata.insert(
                "outcome".to_string(),
                if succeeded { "succeeded" } else { "failed" }.to_string(),
            );
        }
    }

    /// Finalize the job: force progress to 100 and enter the terminal state.
    pub fn finalize(&self, job_id: &str) {
        if let Some(status) = self.write().get_mut(job_id) {
            if status.progress != 100 {
                status.progress_updates += 1;
            }
            status.progress = 100;
            status.state = JobState::Finalized;
        }
    }

    /// Attach a metadata entry to a job.
    pub fn set_metadata(&self, job_id: &str, key: impl Into<String>, value: impl Into<String>) {
        if let Some(status) = self.write().get_mut(job_id) {
            status.metadata.insert(key.into(), value.into());
        }
    }

    /// Latest progress for a job. Unknown ids report 100 by convention.
    pub fn progress_of(&self, job_id: &str) -> u8 {
        self.read().get(job_id).map(|s| s.progress).unwrap_or(100)
    }

    /// Get a snapshot of one job's status.
    pub fn get_status(&self, job_id: &str) -> Option<JobStatus> {
        self.read().get(job_id).cloned()
    }

    /// Get snapshots of all registered jobs.
    pub fn all_status(&self) -> Vec<JobStatus> {
        self.read().values().cloned().collect()
    }

    /// Number of registered jobs.
    pub fn job_count(&self) -> usize {
        self.read().len()
    }
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let registry = JobRegistry::new();
        registry.register("job-1", "export_posts", "user-1");

        let status = registry.get_status("job-1").unwrap();
        assert_eq!(status.name, "export_posts");
        assert_eq!(status.state, JobState::Pending);
        assert_eq!(status.progress, 0);
        assert!(status.finished_at.is_none());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let registry = JobRegistry::new();
        registry.register("job-1", "export_posts", "user-1");

        registry.record_running("job-1");
        assert_eq!(registry.get_status("job-1").unwrap().state, JobState::Running);

        registry.record_outcome("job-1", true);
        let status = registry.get_status("job-1").unwrap();
        assert_eq!(status.state, JobState::Succeeded);
        assert!(status.finished_at.is_some());
        assert_eq!(status.metadata.get("outcome").unwrap(), "succeeded");

        registry.finalize("job-1");
        let status = registry.get_status("job-1").unwrap();
        assert_eq!(status.state, JobState::Finalized);
        assert_eq!(status.progress, 100);
    }

    #[test]
    fn test_failed_outcome() {
        let registry = JobRegistry::new();
        registry.register("job-1", "export_posts", "user-1");
        registry.record_outcome("job-1", false);
        registry.finalize("job-1");

        let status = registry.get_status("job-1").unwrap();
        assert_eq!(status.state, JobState::Finalized);
        assert_eq!(status.progress, 100);
        assert_eq!(status.metadata.get("outcome").unwrap(), "failed");
    }

    #[test]
    fn test_progress_clamped_and_counted() {
        let registry = JobRegistry::new();
        registry.register("job-1", "export_posts", "user-1");

        registry.record_progress("job-1", 0);
        registry.record_progress("job-1", 33);
        registry.record_progress("job-1", 33);
        registry.record_progress("job-1", 250);

        let status = registry.get_status("job-1").unwrap();
        assert_eq!(status.progress, 100);
        // 0, 33 and the clamped 100: the duplicate 33 is not a new value.
        assert_eq!(status.progress_updates, 3);
    }

    #[test]
    fn test_unknown_job_reads_as_complete() {
        let registry = JobRegistry::new();
        assert_eq!(registry.progress_of("missing"), 100);
        assert!(registry.get_status("missing").is_none());

        // Updates to unknown ids must not panic.
        registry.record_running("missing");
        registry.record_progress("missing", 10);
        registry.finalize("missing");
    }

    #[test]
    fn test_unregister() {
        let registry = JobRegistry::new();
        registry.register("job-1", "export_posts", "user-1");
        assert_eq!(registry.job_count(), 1);
        registry.unregister("job-1");
        assert_eq!(registry.job_count(), 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(JobRegistry::new());
        let handles: Vec<_> = (0..10)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    let id = format!("job-{}", i);
                    registry.register(&id, "export_posts", "user-1");
                    registry.record_running(&id);
                    registry.record_progress(&id, 50);
                    registry.record_outcome(&id, true);
                    registry.finalize(&id);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.job_count(), 10);
        for status in registry.all_status() {
            assert_eq!(status.progress, 100);
            assert_eq!(status.state, JobState::Finalized);
        }
    }
}
