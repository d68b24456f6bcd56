//! Orphan deletion and background jobs for linkscope.
//!
//! This crate deletes orphaned files found by `linkscope-scan` and runs
//! scans and deletions as tracked background jobs with live progress,
//! timeout and retention.
//!
//! # Example
//!
//! ```rust,no_run
//! use linkscope_core::ScanConfig;
//! use linkscope_ops::{JobRequest, JobTracker, TrackerConfig};
//!
//! # async fn run() -> Result<(), linkscope_ops::JobError> {
//! let tracker = JobTracker::start(TrackerConfig::default());
//! let config = ScanConfig::new(["/data/downloads"], ["/data/media"]);
//! let id = tracker.submit(JobRequest::ScanFile { config }).await;
//!
//! let job = tracker.get(id)?;
//! println!("{}: {}/{}", job.status, job.progress, job.total);
//! # Ok(())
//! # }
//! ```

mod deleter;
mod error;
mod job;
mod tracker;

pub use deleter::{DeletedFile, DeletionAction, DeletionResult, OrphanDeleter};
pub use error::JobError;
pub use job::{Job, JobId, JobKind, JobOutput, JobRequest, JobStatus};
pub use tracker::{
    DEFAULT_MAX_DURATION, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL, JobTracker, SweepStats,
    TrackerConfig, TrackerConfigBuilder,
};
