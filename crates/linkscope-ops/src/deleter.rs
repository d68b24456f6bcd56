//! Orphan deletion.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use linkscope_core::{Column, ColumnSelector, PathError, ScanConfig, ScanError};
use linkscope_scan::LinkScanner;

/// What happened to a selected orphan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionAction {
    /// Dry run: the file exists and would be removed.
    WouldDelete,
    /// The file was removed.
    Deleted,
}

/// One orphan that was (or would be) removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedFile {
    #[serde(serialize_with = "linkscope_core::lossy::path")]
    pub path: PathBuf,
    /// Size in bytes, captured before removal.
    pub size: u64,
    pub action: DeletionAction,
}

/// Outcome of an orphan deletion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionResult {
    pub deleted_files: Vec<DeletedFile>,
    /// Scan errors followed by deletion errors.
    pub errors: Vec<PathError>,
    pub dry_run: bool,
    pub total_deleted: usize,
    /// Deletion-phase errors only; scan errors are not counted.
    pub total_errors: usize,
}

impl DeletionResult {
    fn new(dry_run: bool) -> Self {
        Self {
            deleted_files: Vec::new(),
            errors: Vec::new(),
            dry_run,
            total_deleted: 0,
            total_errors: 0,
        }
    }

    /// Total bytes freed (or that would be freed).
    pub fn bytes(&self) -> u64 {
        self.deleted_files.iter().map(|f| f.size).sum()
    }
}

/// Deletes the orphans of one or both columns.
///
/// Classification is always recomputed from the filesystem right before
/// deleting. Nothing is touched unless dry run has been switched off
/// explicitly.
///
/// After each removal the parent folder is removed too if it is now empty,
/// except when that folder is one of the configured roots. Roots are never
/// deleted, even when they end up empty.
#[derive(Debug, Clone)]
pub struct OrphanDeleter {
    config: ScanConfig,
    columns: ColumnSelector,
    dry_run: bool,
}

impl OrphanDeleter {
    /// Create a deleter for the selected column(s), in dry-run mode.
    pub fn new(config: ScanConfig, columns: ColumnSelector) -> Self {
        Self {
            config,
            columns,
            dry_run: true,
        }
    }

    /// Set dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Rescan, then delete (or simulate deleting) every selected orphan.
    pub fn run(&self, scanner: &LinkScanner) -> Result<DeletionResult, ScanError> {
        let scan = scanner.scan_files(&self.config)?;
        let mut result = DeletionResult::new(self.dry_run);
        let mut failures = Vec::new();

        for column in self.columns.columns() {
            let orphans = match column {
                Column::A => &scan.orphans_a,
                Column::B => &scan.orphans_b,
            };

            for path in orphans {
                if scanner.context().is_cancelled() {
                    return Err(ScanError::Cancelled);
                }
                match self.remove(column, path) {
                    Ok(file) => result.deleted_files.push(file),
                    Err(err) => failures.push(err),
                }
            }
        }

        result.total_deleted = result.deleted_files.len();
        result.total_errors = failures.len();
        result.errors = scan.errors;
        result.errors.extend(failures);

        tracing::info!(
            dry_run = self.dry_run,
            columns = %self.columns,
            deleted = result.total_deleted,
            errors = result.total_errors,
            "orphan deletion finished"
        );
        Ok(result)
    }

    fn remove(&self, column: Column, path: &Path) -> Result<DeletedFile, PathError> {
        let size = match fs::metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(PathError::not_found(path));
            }
            Err(err) => return Err(ScanError::stat(path, err).into()),
        };

        if self.dry_run {
            return Ok(DeletedFile {
                path: path.to_path_buf(),
                size,
                action: DeletionAction::WouldDelete,
            });
        }

        fs::remove_file(path).map_err(|source| ScanError::Deletion {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), size, "deleted orphan");

        self.prune_parent(column, path);

        Ok(DeletedFile {
            path: path.to_path_buf(),
            size,
            action: DeletionAction::Deleted,
        })
    }

    /// Remove the parent directory if it is now empty. Roots are kept.
    fn prune_parent(&self, column: Column, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if self.config.roots(column).iter().any(|root| root == parent) {
            return;
        }
        // remove_dir refuses non-empty directories; any failure is ignored.
        if fs::remove_dir(parent).is_ok() {
            tracing::debug!(path = %parent.display(), "removed empty folder");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn deleter(temp: &TempDir, dry_run: bool) -> OrphanDeleter {
        let config = ScanConfig::new([temp.path().join("dl")], [temp.path().join("lib")]);
        OrphanDeleter::new(config, ColumnSelector::Both).dry_run(dry_run)
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("dl/gone.mkv");

        for dry_run in [true, false] {
            let err = deleter(&temp, dry_run).remove(Column::A, &missing).unwrap_err();
            assert_eq!(err, PathError::not_found(&missing));
        }
    }

    #[test]
    fn test_dry_run_leaves_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("dl/show/x.mkv");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "12345").unwrap();

        let entry = deleter(&temp, true).remove(Column::A, &file).unwrap();
        assert_eq!(entry.action, DeletionAction::WouldDelete);
        assert_eq!(entry.size, 5);
        assert!(file.exists());
    }

    #[test]
    fn test_prune_keeps_root() {
        let temp = TempDir::new().unwrap();
        let dl = temp.path().join("dl");
        fs::create_dir_all(&dl).unwrap();
        let file = dl.join("x.mkv");
        fs::write(&file, "x").unwrap();

        let entry = deleter(&temp, false).remove(Column::A, &file).unwrap();
        assert_eq!(entry.action, DeletionAction::Deleted);
        assert!(!file.exists());
        assert!(dl.is_dir());
    }

    #[test]
    fn test_prune_removes_empty_folder_only() {
        let temp = TempDir::new().unwrap();
        let lonely = temp.path().join("lib/lonely/z.mkv");
        let crowded = temp.path().join("lib/crowded/z.mkv");
        for file in [&lonely, &crowded] {
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, "z").unwrap();
        }
        fs::write(temp.path().join("lib/crowded/poster.jpg"), "p").unwrap();

        let deleter = deleter(&temp, false);
        deleter.remove(Column::B, &lonely).unwrap();
        deleter.remove(Column::B, &crowded).unwrap();

        assert!(!temp.path().join("lib/lonely").exists());
        assert!(temp.path().join("lib/crowded").is_dir());
    }
}
