//! Job types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use linkscope_core::{ColumnSelector, ScanConfig, ScanError, ScanResult};
use linkscope_scan::LinkScanner;

use crate::deleter::{DeletionResult, OrphanDeleter};

/// Opaque identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// The kind of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobKind {
    ScanFile,
    ScanFolder,
    DeleteOrphans,
}

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Error,
    Timeout,
}

impl JobStatus {
    /// Whether the job has reached a final state.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Running)
    }
}

/// A job to submit: its kind together with its parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobRequest {
    /// Classify every file individually.
    ScanFile { config: ScanConfig },
    /// Classify with folder aggregation on the checked column(s).
    ScanFolder {
        config: ScanConfig,
        check: ColumnSelector,
    },
    /// Rescan and delete orphans of the selected column(s).
    DeleteOrphans {
        config: ScanConfig,
        columns: ColumnSelector,
        dry_run: bool,
    },
}

impl JobRequest {
    pub fn kind(&self) -> JobKind {
        match self {
            JobRequest::ScanFile { .. } => JobKind::ScanFile,
            JobRequest::ScanFolder { .. } => JobKind::ScanFolder,
            JobRequest::DeleteOrphans { .. } => JobKind::DeleteOrphans,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        match self {
            JobRequest::ScanFile { config }
            | JobRequest::ScanFolder { config, .. }
            | JobRequest::DeleteOrphans { config, .. } => config,
        }
    }

    /// Run the request to completion on the current thread.
    pub fn execute(&self, scanner: &LinkScanner) -> Result<JobOutput, ScanError> {
        match self {
            JobRequest::ScanFile { config } => scanner.scan_files(config).map(JobOutput::Scan),
            JobRequest::ScanFolder { config, check } => {
                scanner.scan_folders(config, *check).map(JobOutput::Scan)
            }
            JobRequest::DeleteOrphans {
                config,
                columns,
                dry_run,
            } => OrphanDeleter::new(config.clone(), *columns)
                .dry_run(*dry_run)
                .run(scanner)
                .map(JobOutput::Deletion),
        }
    }
}

/// Result payload of a completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JobOutput {
    Scan(ScanResult),
    Deletion(DeletionResult),
}

impl JobOutput {
    pub fn as_scan(&self) -> Option<&ScanResult> {
        match self {
            JobOutput::Scan(result) => Some(result),
            JobOutput::Deletion(_) => None,
        }
    }

    pub fn as_deletion(&self) -> Option<&DeletionResult> {
        match self {
            JobOutput::Deletion(result) => Some(result),
            JobOutput::Scan(_) => None,
        }
    }
}

/// Snapshot of a tracked job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Files visited so far.
    pub progress: u64,
    /// Files counted before the job started.
    pub total: u64,
    /// Name of the file being visited.
    pub current_item: Option<CompactString>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result: Option<JobOutput>,
    pub error: Option<String>,
}

impl Job {
    pub(crate) fn new(id: JobId, kind: JobKind, total: u64) -> Self {
        Self {
            id,
            kind,
            status: JobStatus::Running,
            progress: 0,
            total,
            current_item: None,
            created_at: Utc::now(),
            completed_at: None,
            result: None,
            error: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == JobStatus::Running
    }

    /// Progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.total > 0 {
            (self.progress.min(self.total) as f64 / self.total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Record a visited file.
    pub(crate) fn advance(&mut self, item: CompactString) {
        if self.is_running() {
            self.progress += 1;
            self.current_item = Some(item);
        }
    }

    /// Move to `completed`. Returns false if already terminal.
    pub(crate) fn complete(&mut self, output: JobOutput) -> bool {
        self.finish(JobStatus::Completed, Some(output), None)
    }

    /// Move to `error`. Returns false if already terminal.
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> bool {
        self.finish(JobStatus::Error, None, Some(message.into()))
    }

    /// Move to `timeout`. Returns false if already terminal.
    pub(crate) fn time_out(&mut self, message: impl Into<String>) -> bool {
        self.finish(JobStatus::Timeout, None, Some(message.into()))
    }

    fn finish(
        &mut self,
        status: JobStatus,
        result: Option<JobOutput>,
        error: Option<String>,
    ) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = status;
        self.result = result;
        self.error = error;
        self.completed_at = Some(Utc::now());
        true
    }
}
