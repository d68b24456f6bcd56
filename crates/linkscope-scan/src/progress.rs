//! Traversal context: progress reporting and cancellation.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use linkscope_core::Column;
use tokio_util::sync::CancellationToken;

/// Receives a notification for every file the traverser visits.
///
/// Implementations must be cheap: the sink is called once per file on the
/// walking thread.
pub trait ProgressSink: Send + Sync {
    /// A file was visited in the given column.
    fn file_visited(&self, column: Column, path: &Path);
}

/// A sink that ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn file_visited(&self, _column: Column, _path: &Path) {}
}

/// A thread-safe sink that counts visited files.
#[derive(Debug)]
pub struct ProgressCounter {
    files_scanned: AtomicU64,
}

impl ProgressCounter {
    pub fn new() -> Self {
        Self {
            files_scanned: AtomicU64::new(0),
        }
    }

    pub fn files_scanned(&self) -> u64 {
        self.files_scanned.load(Ordering::Relaxed)
    }
}

impl Default for ProgressCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ProgressCounter {
    fn file_visited(&self, _column: Column, _path: &Path) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }
}

/// Explicit state threaded through a traversal.
///
/// Carries where to report progress and the token that stops the walk at
/// the next entry once cancelled.
#[derive(Clone)]
pub struct TraversalContext {
    progress: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
}

impl TraversalContext {
    /// Create a context from a sink and a cancellation token.
    pub fn new(progress: Arc<dyn ProgressSink>, cancel: CancellationToken) -> Self {
        Self { progress, cancel }
    }

    /// A context with no progress reporting and a private token.
    pub fn detached() -> Self {
        Self::new(Arc::new(NoProgress), CancellationToken::new())
    }

    /// Report a visited file.
    pub fn record_file(&self, column: Column, path: &Path) {
        self.progress.file_visited(column, path);
    }

    /// Check whether the traversal should stop.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The cancellation token for this traversal.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Default for TraversalContext {
    fn default() -> Self {
        Self::detached()
    }
}

impl std::fmt::Debug for TraversalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraversalContext")
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
