//! Hardlink identity scanning engine for linkscope.
//!
//! This crate walks a source column (downloads) and a destination column
//! (media library) and matches their files by `(device, inode)` identity.
//!
//! # Overview
//!
//! - **Traversal** via jwalk, depth-bounded, never aborting on one failure
//! - **Identity grouping** with first-encounter ordering
//! - **Classification** into synced, orphaned and conflicting files
//! - **Folder mode**, where one linked file marks its whole folder linked
//! - **Progress and cancellation** through an explicit [`TraversalContext`]
//!
//! # Example
//!
//! ```rust,no_run
//! use linkscope_scan::{LinkScanner, ScanConfig};
//!
//! let config = ScanConfig::new(["/data/downloads"], ["/data/media"]);
//! let result = LinkScanner::new().scan_files(&config).unwrap();
//!
//! println!("{} synced, {} orphans in downloads", result.synced.len(), result.orphans_a.len());
//! ```
//!
//! # Progress Monitoring
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use linkscope_scan::{LinkScanner, ProgressCounter, ScanConfig, TraversalContext};
//! use tokio_util::sync::CancellationToken;
//!
//! let counter = Arc::new(ProgressCounter::new());
//! let ctx = TraversalContext::new(counter.clone(), CancellationToken::new());
//! let config = ScanConfig::new(["/data/downloads"], ["/data/media"]);
//!
//! LinkScanner::with_context(ctx).scan_files(&config).unwrap();
//! println!("Visited {} files", counter.files_scanned());
//! ```

mod folder;
mod index;
mod progress;
mod scanner;
mod traverser;

pub use folder::FolderAggregator;
pub use index::{IdentityGroup, InodeIndex, LinkStatus};
pub use progress::{NoProgress, ProgressCounter, ProgressSink, TraversalContext};
pub use scanner::LinkScanner;
pub use traverser::{PathTraverser, Traversal};

// Re-export core types for convenience
pub use linkscope_core::{
    Column, ColumnSelector, ConflictEntry, FileRecord, InodeKey, PathError, PerColumn, ScanConfig,
    ScanError, ScanResult, SyncedFolders, SyncedPair,
};
