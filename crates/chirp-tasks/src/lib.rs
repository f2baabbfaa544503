//! # chirp-tasks
//!
//! Background task execution and progress reporting for chirp.
//!
//! A [`TaskQueue`] enqueues named jobs and hands back a [`queue::JobHandle`];
//! a [`Worker`] drains the queue, runs the registered routine for each job,
//! and always finalizes: whatever the routine does (succeed, fail, panic),
//! progress reaches 100 and the task record's completion flag is set, so the
//! user is never left with a stuck in-progress task.
//!
//! Progress flows to two places on every report: the in-process
//! [`JobRegistry`] (polled by the web layer) and a `task_progress`
//! notification for the owning user.

pub mod context;
pub mod error;
pub mod jobs;
pub mod mailer;
pub mod queue;
pub mod registry;
pub mod worker;

pub use context::JobContext;
pub use error::TaskError;
pub use jobs::{register_builtin_jobs, EXPORT_POSTS};
pub use mailer::{Attachment, LogMailer, Mailer, MemoryMailer, OutboundMessage};
pub use queue::{JobHandle, QueuedJob, TaskQueue};
pub use registry::{JobRegistry, JobState, JobStatus};
pub use worker::{JobTable, Worker};
