//! Error types for scanning and deletion.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while traversing or deleting.
///
/// Most variants are per-item and non-fatal: callers convert them into a
/// [`PathError`] and keep going. Only [`ScanError::Cancelled`] ends an
/// operation early.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A configured root does not exist.
    #[error("Directory does not exist: {path}")]
    DirectoryMissing { path: PathBuf },

    /// A configured root exists but is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A file disappeared between listing and stat.
    #[error("File vanished: {path}")]
    FileVanished { path: PathBuf },

    /// Stat failed for a reason other than the file vanishing.
    #[error("Cannot stat {path}: {source}")]
    FileStat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading a directory failed mid-walk.
    #[error("Cannot read {path}: {message}")]
    ReadDir { path: PathBuf, message: String },

    /// Removing a file failed.
    #[error("Cannot delete {path}: {source}")]
    Deletion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ScanError {
    /// Classify a stat failure with path context.
    pub fn stat(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileVanished { path },
            _ => Self::FileStat { path, source },
        }
    }

    /// Classify a failure to open a configured root.
    pub fn root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::DirectoryMissing { path },
            _ => Self::FileStat { path, source },
        }
    }

    /// Whether this is the expected stat race, which is never reported.
    pub fn is_vanished(&self) -> bool {
        matches!(self, Self::FileVanished { .. })
    }

    /// The path this error refers to, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::DirectoryMissing { path }
            | Self::NotADirectory { path }
            | Self::FileVanished { path }
            | Self::FileStat { path, .. }
            | Self::ReadDir { path, .. }
            | Self::Deletion { path, .. } => Some(path),
            Self::Cancelled | Self::Other { .. } => None,
        }
    }
}

/// Non-fatal failure attached to a path, accumulated alongside results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathError {
    /// Path where the failure occurred.
    #[serde(serialize_with = "crate::lossy::path")]
    pub path: PathBuf,
    /// Human-readable message.
    pub error: String,
}

impl PathError {
    /// Create a new path error.
    pub fn new(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            error: error.into(),
        }
    }

    /// A file selected for deletion no longer exists.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(path, "File not found")
    }
}

impl From<ScanError> for PathError {
    fn from(err: ScanError) -> Self {
        let path = err.path().cloned().unwrap_or_default();
        Self::new(path, err.to_string())
    }
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// Errors raised while loading or saving persisted settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON for the expected shape.
    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A tab id was not found in the settings.
    #[error("Tab '{id}' does not exist")]
    UnknownTab { id: String },

    /// A tab is missing paths on one of its columns.
    #[error("No paths configured for tab '{id}'")]
    EmptyTab { id: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_not_found_is_vanished() {
        let err = ScanError::stat(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_vanished());
    }

    #[test]
    fn test_stat_permission_is_reported() {
        let err = ScanError::stat(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, ScanError::FileStat { .. }));
        let reported = PathError::from(err);
        assert_eq!(reported.path, PathBuf::from("/test/path"));
        assert!(reported.error.contains("denied"));
    }

    #[test]
    fn test_missing_root() {
        let err = ScanError::root(
            "/nope",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(err, ScanError::DirectoryMissing { .. }));
    }

    #[test]
    fn test_path_error_serializes_flat() {
        let json = serde_json::to_value(PathError::not_found("/dl/x.mkv")).unwrap();
        assert_eq!(json["path"], "/dl/x.mkv");
        assert_eq!(json["error"], "File not found");
        assert_eq!(json.as_object().unwrap().len(), 2);
    }
}
