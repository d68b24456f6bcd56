//! Scan result container.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::lossy;
use crate::record::PerColumn;

/// One file hard-linked exactly once on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncedPair {
    #[serde(serialize_with = "lossy::path")]
    pub path_a: PathBuf,
    #[serde(serialize_with = "lossy::path")]
    pub path_b: PathBuf,
}

/// An identity group present on both sides but not exactly once on each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    #[serde(serialize_with = "lossy::paths")]
    pub paths_a: Vec<PathBuf>,
    #[serde(serialize_with = "lossy::paths")]
    pub paths_b: Vec<PathBuf>,
}

/// Folders considered linked in folder scan mode, per column.
pub type SyncedFolders = PerColumn<Vec<PathBuf>>;

/// Classification of every file seen by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Files linked exactly once on each side.
    pub synced: Vec<SyncedPair>,
    /// Files present only in column A.
    #[serde(serialize_with = "lossy::paths")]
    pub orphans_a: Vec<PathBuf>,
    /// Files present only in column B.
    #[serde(serialize_with = "lossy::paths")]
    pub orphans_b: Vec<PathBuf>,
    /// Ambiguous identity groups.
    pub conflicts: Vec<ConflictEntry>,
    /// Folder-level sync status (folder mode only).
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "lossy::folders"
    )]
    pub synced_folders: Option<SyncedFolders>,
    /// Non-fatal errors met during traversal.
    #[serde(default)]
    pub errors: Vec<PathError>,
}

impl ScanResult {
    /// Create an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of file paths classified.
    pub fn total_paths(&self) -> usize {
        self.synced.len() * 2
            + self.orphans_a.len()
            + self.orphans_b.len()
            + self
                .conflicts
                .iter()
                .map(|c| c.paths_a.len() + c.paths_b.len())
                .sum::<usize>()
    }

    /// Check if every file is synced.
    pub fn is_clean(&self) -> bool {
        self.orphans_a.is_empty() && self.orphans_b.is_empty() && self.conflicts.is_empty()
    }
}
