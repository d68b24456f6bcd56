//! Background job tracker.
//!
//! Every submitted job runs on its own blocking worker and reports progress
//! into a shared job table. A periodic sweep times out jobs that run too long
//! and evicts finished jobs once their retention window has passed.

use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;

use compact_str::CompactString;
use dashmap::DashMap;
use derive_builder::Builder;
use tokio::task::JoinError;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use linkscope_core::{Column, ScanError};
use linkscope_scan::{LinkScanner, ProgressSink, TraversalContext};

use crate::error::JobError;
use crate::job::{Job, JobId, JobKind, JobOutput, JobRequest};

/// Default limit on how long a job may stay running.
pub const DEFAULT_MAX_DURATION: Duration = Duration::from_secs(60 * 60);

/// Default time a finished job stays queryable.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 60);

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Timing configuration of a [`JobTracker`].
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct TrackerConfig {
    /// A running job older than this is marked `timeout` and cancelled.
    pub max_duration: Duration,
    /// A finished job older than this is evicted.
    pub retention: Duration,
    /// How often the sweep runs.
    pub sweep_interval: Duration,
}

impl TrackerConfig {
    pub fn builder() -> TrackerConfigBuilder {
        TrackerConfigBuilder::default()
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_duration: DEFAULT_MAX_DURATION,
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub timed_out: usize,
    pub evicted: usize,
}

#[derive(Debug)]
struct JobEntry {
    job: Job,
    cancel: CancellationToken,
    started: Instant,
    finished: Option<Instant>,
}

impl JobEntry {
    fn new(job: Job, cancel: CancellationToken) -> Self {
        Self {
            job,
            cancel,
            started: Instant::now(),
            finished: None,
        }
    }

    /// Apply a terminal transition, stamping the finish time if it took.
    fn settle(&mut self, transition: impl FnOnce(&mut Job) -> bool) -> bool {
        let applied = transition(&mut self.job);
        if applied {
            self.finished = Some(Instant::now());
        }
        applied
    }
}

#[derive(Debug)]
struct Shared {
    jobs: DashMap<JobId, JobEntry>,
    config: TrackerConfig,
}

impl Shared {
    fn record_outcome(&self, id: JobId, outcome: Result<Result<JobOutput, ScanError>, JoinError>) {
        let Some(mut entry) = self.jobs.get_mut(&id) else {
            tracing::debug!(%id, "job evicted before its worker finished");
            return;
        };

        let applied = match outcome {
            Ok(Ok(output)) => entry.settle(|job| job.complete(output)),
            Ok(Err(ScanError::Cancelled)) => {
                entry.settle(|job| job.fail(JobError::Cancelled.to_string()))
            }
            Ok(Err(err)) => entry.settle(|job| job.fail(err.to_string())),
            Err(err) => {
                let message = JobError::Worker {
                    message: panic_message(err),
                }
                .to_string();
                tracing::error!(%id, error = %message, "job worker failed");
                entry.settle(|job| job.fail(message))
            }
        };

        if applied {
            tracing::info!(
                %id,
                status = %entry.job.status,
                progress = entry.job.progress,
                elapsed_ms = entry.started.elapsed().as_millis() as u64,
                "job finished"
            );
        } else {
            tracing::debug!(%id, status = %entry.job.status, "discarding late job result");
        }
    }

    fn sweep(&self) -> SweepStats {
        let now = Instant::now();
        let mut stats = SweepStats::default();

        for mut entry in self.jobs.iter_mut() {
            let overdue = entry.job.is_running()
                && now.saturating_duration_since(entry.started) >= self.config.max_duration;
            if !overdue {
                continue;
            }
            entry.cancel.cancel();
            let message = JobError::TimedOut {
                limit: self.config.max_duration,
            }
            .to_string();
            if entry.settle(|job| job.time_out(message)) {
                stats.timed_out += 1;
                tracing::warn!(id = %entry.job.id, "job timed out");
            }
        }

        self.jobs.retain(|id, entry| {
            let expired = entry
                .finished
                .is_some_and(|at| now.saturating_duration_since(at) >= self.config.retention);
            if expired {
                stats.evicted += 1;
                tracing::debug!(%id, "evicting finished job");
            }
            !expired
        });

        stats
    }
}

fn panic_message(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "worker panicked".to_string())
}

/// Progress sink that writes into one job's entry.
struct JobProgress {
    id: JobId,
    shared: Weak<Shared>,
}

impl ProgressSink for JobProgress {
    fn file_visited(&self, _column: Column, path: &Path) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        if let Some(mut entry) = shared.jobs.get_mut(&self.id) {
            let name = path
                .file_name()
                .map(|n| CompactString::new(n.to_string_lossy()))
                .unwrap_or_default();
            entry.job.advance(name);
        }
    }
}

/// Runs scans and deletions in the background and tracks their state.
///
/// Must be started inside a tokio runtime. Dropping the tracker stops the
/// sweep and cancels every running job.
#[derive(Debug)]
pub struct JobTracker {
    shared: Arc<Shared>,
    shutdown: CancellationToken,
}

impl JobTracker {
    /// Create a tracker and spawn its periodic sweep.
    pub fn start(config: TrackerConfig) -> Self {
        let interval = config.sweep_interval.max(Duration::from_millis(1));
        let shared = Arc::new(Shared {
            jobs: DashMap::new(),
            config,
        });
        let shutdown = CancellationToken::new();

        let sweeper = Arc::downgrade(&shared);
        let stop = shutdown.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(shared) = sweeper.upgrade() else { break };
                        let stats = shared.sweep();
                        if stats != SweepStats::default() {
                            tracing::debug!(timed_out = stats.timed_out, evicted = stats.evicted, "job sweep");
                        }
                    }
                }
            }
            tracing::debug!("job sweeper stopped");
        });

        Self { shared, shutdown }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.shared.config
    }

    /// Submit a job and return its id without waiting for it.
    ///
    /// The files the job will visit are counted first so that its `total` is
    /// known from the start.
    pub async fn submit(&self, request: JobRequest) -> JobId {
        let config = request.config().clone();
        let total = match tokio::task::spawn_blocking(move || LinkScanner::count_files(&config)).await
        {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!(error = %err, "counting files failed");
                0
            }
        };

        let kind = request.kind();
        self.spawn_job(kind, total, move |ctx| {
            request.execute(&LinkScanner::with_context(ctx))
        })
    }

    /// Register a running job and hand `work` to a blocking worker.
    pub(crate) fn spawn_job<F>(&self, kind: JobKind, total: u64, work: F) -> JobId
    where
        F: FnOnce(TraversalContext) -> Result<JobOutput, ScanError> + Send + 'static,
    {
        let id = JobId::new();
        let cancel = self.shutdown.child_token();
        self.shared
            .jobs
            .insert(id, JobEntry::new(Job::new(id, kind, total), cancel.clone()));
        tracing::info!(%id, %kind, total, "job submitted");

        let sink = Arc::new(JobProgress {
            id,
            shared: Arc::downgrade(&self.shared),
        });
        let ctx = TraversalContext::new(sink, cancel);
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || work(ctx)).await;
            shared.record_outcome(id, outcome);
        });

        id
    }

    /// Snapshot of a job.
    pub fn get(&self, id: JobId) -> Result<Job, JobError> {
        self.shared
            .jobs
            .get(&id)
            .map(|entry| entry.job.clone())
            .ok_or(JobError::NotFound { id })
    }

    /// Snapshots of all retained jobs, newest first.
    pub fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self
            .shared
            .jobs
            .iter()
            .map(|entry| entry.job.clone())
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Cancel a job. A running job ends as `error`; a finished one is left as is.
    pub fn cancel(&self, id: JobId) -> Result<Job, JobError> {
        let mut entry = self
            .shared
            .jobs
            .get_mut(&id)
            .ok_or(JobError::NotFound { id })?;
        entry.cancel.cancel();
        if entry.settle(|job| job.fail(JobError::Cancelled.to_string())) {
            tracing::info!(%id, "job cancelled");
        }
        Ok(entry.job.clone())
    }

    /// Run one sweep pass now.
    pub fn sweep(&self) -> SweepStats {
        self.shared.sweep()
    }

    /// Stop the sweep and cancel every running job.
    pub fn shutdown(&self) {
        if !self.shutdown.is_cancelled() {
            tracing::info!(jobs = self.shared.jobs.len(), "shutting down job tracker");
        }
        self.shutdown.cancel();
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
