//! Job engine errors.

use std::time::Duration;

use thiserror::Error;

use crate::job::JobId;

/// Errors of the job tracker.
///
/// Apart from [`JobError::NotFound`], these are recorded as the terminal
/// `error` message of a job rather than returned to callers.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job not found: {id}")]
    NotFound { id: JobId },

    #[error("Job cancelled")]
    Cancelled,

    #[error("Job exceeded maximum duration of {}s", limit.as_secs())]
    TimedOut { limit: Duration },

    #[error("Job worker failed: {message}")]
    Worker { message: String },
}
