//! Folder-level link aggregation.
//!
//! A folder counts as linked once it holds at least one file that has a
//! link on the other side. Unlinked siblings in such a folder (subtitles,
//! artwork, sample files) are then not reported as orphans.

use std::path::PathBuf;

use indexmap::IndexSet;
use linkscope_core::{ColumnSelector, PerColumn, ScanConfig, ScanResult};

use crate::index::InodeIndex;

/// Derives folder-level sync status from identity groups.
#[derive(Debug, Clone, Copy)]
pub struct FolderAggregator<'a> {
    config: &'a ScanConfig,
    check: ColumnSelector,
}

impl<'a> FolderAggregator<'a> {
    /// Create an aggregator that marks folders in the selected column(s).
    pub fn new(config: &'a ScanConfig, check: ColumnSelector) -> Self {
        Self { config, check }
    }

    /// Parent folders of every linked file, per selected column.
    ///
    /// Only paths under one of the column's configured roots contribute.
    pub fn synced_folders(&self, index: &InodeIndex) -> PerColumn<IndexSet<PathBuf>> {
        let mut folders = PerColumn::<IndexSet<PathBuf>>::default();

        for (_, group) in index.groups().filter(|(_, g)| g.is_linked()) {
            for column in self.check.columns() {
                for path in group.paths(column) {
                    if !self.config.is_under_root(column, path) {
                        continue;
                    }
                    if let Some(parent) = path.parent() {
                        folders[column].insert(parent.to_path_buf());
                    }
                }
            }
        }

        folders
    }

    /// Classify files, suppressing orphans that sit in a linked folder.
    pub fn aggregate(&self, index: &InodeIndex) -> ScanResult {
        let folders = self.synced_folders(index);
        let mut result = index.classify();

        let in_linked = |set: &IndexSet<PathBuf>, path: &PathBuf| {
            path.parent().is_some_and(|parent| set.contains(parent))
        };
        result.orphans_a.retain(|p| !in_linked(&folders.a, p));
        result.orphans_b.retain(|p| !in_linked(&folders.b, p));

        result.synced_folders = Some(folders.map(|set| set.into_iter().collect()));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkscope_core::{Column, FileRecord, InodeKey};

    fn rec(path: &str, column: Column, inode: u64) -> FileRecord {
        FileRecord::new(path, column, InodeKey::new(1, inode))
    }

    fn show_index() -> InodeIndex {
        [
            rec("/dl/show/e01.mkv", Column::A, 1),
            rec("/dl/show/e01.srt", Column::A, 2),
            rec("/dl/other/lone.mkv", Column::A, 3),
            rec("/lib/Show/S01/e01.mkv", Column::B, 1),
            rec("/lib/Show/S01/poster.jpg", Column::B, 4),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_sibling_suppressed_in_checked_column() {
        let config = ScanConfig::new(["/dl"], ["/lib"]);
        let result = FolderAggregator::new(&config, ColumnSelector::A).aggregate(&show_index());

        assert_eq!(result.orphans_a, vec![PathBuf::from("/dl/other/lone.mkv")]);
        // B is not checked, so its unlinked sibling stays an orphan.
        assert_eq!(result.orphans_b, vec![PathBuf::from("/lib/Show/S01/poster.jpg")]);
        assert_eq!(result.synced.len(), 1);

        let folders = result.synced_folders.unwrap();
        assert_eq!(folders.a, vec![PathBuf::from("/dl/show")]);
        assert!(folders.b.is_empty());
    }

    #[test]
    fn test_both_columns() {
        let config = ScanConfig::new(["/dl"], ["/lib"]);
        let result =
            FolderAggregator::new(&config, ColumnSelector::Both).aggregate(&show_index());

        assert_eq!(result.orphans_a, vec![PathBuf::from("/dl/other/lone.mkv")]);
        assert!(result.orphans_b.is_empty());
        let folders = result.synced_folders.unwrap();
        assert_eq!(folders.b, vec![PathBuf::from("/lib/Show/S01")]);
    }

    #[test]
    fn test_root_prefix_needs_component_boundary() {
        let config = ScanConfig::new(["/dl"], ["/lib"]);
        let index: InodeIndex = [
            rec("/dl2/show/e01.mkv", Column::A, 1),
            rec("/lib/e01.mkv", Column::B, 1),
        ]
        .into_iter()
        .collect();

        let folders = FolderAggregator::new(&config, ColumnSelector::A).synced_folders(&index);
        assert!(folders.a.is_empty());
    }

    #[test]
    fn test_conflicts_still_mark_folders() {
        let config = ScanConfig::new(["/dl"], ["/lib"]);
        let index: InodeIndex = [
            rec("/dl/a/p1", Column::A, 1),
            rec("/dl/a/p2", Column::A, 1),
            rec("/dl/a/extra.nfo", Column::A, 2),
            rec("/lib/p3", Column::B, 1),
        ]
        .into_iter()
        .collect();

        let result = FolderAggregator::new(&config, ColumnSelector::A).aggregate(&index);
        assert_eq!(result.conflicts.len(), 1);
        assert!(result.orphans_a.is_empty());
    }
}
