//! Inode identity grouping and link classification.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use linkscope_core::{
    Column, ConflictEntry, FileRecord, InodeKey, PerColumn, ScanResult, SyncedPair,
};

/// All paths sharing one `(device, inode)` identity, split by column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityGroup {
    paths: PerColumn<Vec<PathBuf>>,
}

/// Outcome of classifying one identity group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkStatus<'a> {
    /// Exactly one path on each side.
    Synced { a: &'a Path, b: &'a Path },
    /// Present only in column A.
    OrphanA(&'a [PathBuf]),
    /// Present only in column B.
    OrphanB(&'a [PathBuf]),
    /// Any other cardinality; left for the user to resolve.
    Conflict {
        a: &'a [PathBuf],
        b: &'a [PathBuf],
    },
}

impl IdentityGroup {
    /// Paths in a column, in first-encounter order.
    pub fn paths(&self, column: Column) -> &[PathBuf] {
        &self.paths[column]
    }

    /// Number of links in a column.
    pub fn count(&self, column: Column) -> usize {
        self.paths[column].len()
    }

    /// Whether the identity has at least one link on each side.
    pub fn is_linked(&self) -> bool {
        self.count(Column::A) > 0 && self.count(Column::B) > 0
    }

    /// Classify the group. Exactly one status applies.
    pub fn classify(&self) -> LinkStatus<'_> {
        let (a, b) = (&self.paths.a, &self.paths.b);
        match (a.len(), b.len()) {
            (1, 1) => LinkStatus::Synced { a: &a[0], b: &b[0] },
            (n, 0) if n > 0 => LinkStatus::OrphanA(a),
            (0, n) if n > 0 => LinkStatus::OrphanB(b),
            _ => LinkStatus::Conflict { a, b },
        }
    }
}

/// Groups file records by filesystem identity across both columns.
///
/// Group order is the order in which each identity was first seen, so a
/// single run is deterministic for a given traversal order.
#[derive(Debug, Default)]
pub struct InodeIndex {
    groups: IndexMap<InodeKey, IdentityGroup>,
    records: usize,
}

impl InodeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to the group for its identity.
    pub fn insert(&mut self, record: FileRecord) {
        self.groups
            .entry(record.key)
            .or_default()
            .paths[record.column]
            .push(record.path);
        self.records += 1;
    }

    /// Look up the group for an identity.
    pub fn get(&self, key: &InodeKey) -> Option<&IdentityGroup> {
        self.groups.get(key)
    }

    /// Iterate over all groups in first-encounter order.
    pub fn groups(&self) -> impl Iterator<Item = (&InodeKey, &IdentityGroup)> {
        self.groups.iter()
    }

    /// Number of distinct identities.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Check if no records have been added.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of records added.
    pub fn record_count(&self) -> usize {
        self.records
    }

    /// Classify every group into a file-level result.
    pub fn classify(&self) -> ScanResult {
        let mut result = ScanResult::new();

        for group in self.groups.values() {
            match group.classify() {
                LinkStatus::Synced { a, b } => result.synced.push(SyncedPair {
                    path_a: a.to_path_buf(),
                    path_b: b.to_path_buf(),
                }),
                LinkStatus::OrphanA(paths) => result.orphans_a.extend_from_slice(paths),
                LinkStatus::OrphanB(paths) => result.orphans_b.extend_from_slice(paths),
                LinkStatus::Conflict { a, b } => result.conflicts.push(ConflictEntry {
                    paths_a: a.to_vec(),
                    paths_b: b.to_vec(),
                }),
            }
        }

        result
    }
}

impl Extend<FileRecord> for InodeIndex {
    fn extend<I: IntoIterator<Item = FileRecord>>(&mut self, iter: I) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<FileRecord> for InodeIndex {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}
