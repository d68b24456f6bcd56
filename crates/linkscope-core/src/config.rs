//! Scan configuration types.

use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::record::Column;

/// Configuration for a two-column scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Roots of column A (source side).
    #[serde(serialize_with = "crate::lossy::paths")]
    pub roots_a: Vec<PathBuf>,

    /// Roots of column B (destination side).
    #[serde(serialize_with = "crate::lossy::paths")]
    pub roots_b: Vec<PathBuf>,

    /// Maximum directory depth to descend into (None = unlimited).
    ///
    /// Files inside a directory at exactly this depth are still included.
    #[builder(default)]
    #[serde(default)]
    pub max_depth: Option<u32>,

    /// Number of threads for directory reads (0 = auto-detect).
    #[builder(default = "0")]
    #[serde(default)]
    pub threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub include_hidden: bool,
}

fn default_true() -> bool {
    true
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        for (name, roots) in [("A", &self.roots_a), ("B", &self.roots_b)] {
            match roots {
                Some(roots) if roots.is_empty() => {
                    return Err(format!("Column {name} needs at least one root"));
                }
                Some(roots) if roots.iter().any(|r| r.as_os_str().is_empty()) => {
                    return Err(format!("Column {name} has an empty root path"));
                }
                Some(_) => {}
                None => return Err(format!("Roots for column {name} are required")),
            }
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a simple config for two root lists.
    pub fn new<A, B>(roots_a: A, roots_b: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<PathBuf>,
        B: IntoIterator,
        B::Item: Into<PathBuf>,
    {
        Self {
            roots_a: roots_a.into_iter().map(Into::into).collect(),
            roots_b: roots_b.into_iter().map(Into::into).collect(),
            max_depth: None,
            threads: 0,
            include_hidden: true,
        }
    }

    /// Set the depth limit.
    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Roots configured for a column.
    pub fn roots(&self, column: Column) -> &[PathBuf] {
        match column {
            Column::A => &self.roots_a,
            Column::B => &self.roots_b,
        }
    }

    /// Check whether a path lies under one of a column's roots.
    ///
    /// Matching is by whole path components, so a root `/data/downloads`
    /// does not contain `/data/downloads2/file`.
    pub fn is_under_root(&self, column: Column, path: &Path) -> bool {
        self.roots(column).iter().any(|root| path.starts_with(root))
    }
}

/// Convert a signed depth (negative = unlimited) into a depth limit.
pub fn depth_limit(value: i64) -> Option<u32> {
    if value < 0 {
        None
    } else {
        Some(u32::try_from(value).unwrap_or(u32::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ScanConfig::builder()
            .roots_a(vec![PathBuf::from("/dl")])
            .roots_b(vec![PathBuf::from("/lib")])
            .max_depth(Some(2))
            .threads(4usize)
            .build()
            .unwrap();

        assert_eq!(config.roots(Column::A), [PathBuf::from("/dl")]);
        assert_eq!(config.max_depth, Some(2));
        assert_eq!(config.threads, 4);
        assert!(config.include_hidden);
    }

    #[test]
    fn test_builder_rejects_empty_column() {
        let err = ScanConfig::builder()
            .roots_a(vec![PathBuf::from("/dl")])
            .roots_b(Vec::<PathBuf>::new())
            .build();
        assert!(err.is_err());
    }

    #[test]
    fn test_root_containment_respects_components() {
        let config = ScanConfig::new(["/data/downloads"], ["/data/media"]);
        assert!(config.is_under_root(Column::A, Path::new("/data/downloads/x.mkv")));
        assert!(!config.is_under_root(Column::A, Path::new("/data/downloads2/x.mkv")));
        assert!(!config.is_under_root(Column::B, Path::new("/data/downloads/x.mkv")));
    }

    #[test]
    fn test_depth_limit() {
        assert_eq!(depth_limit(-1), None);
        assert_eq!(depth_limit(-7), None);
        assert_eq!(depth_limit(0), Some(0));
        assert_eq!(depth_limit(3), Some(3));
    }
}
