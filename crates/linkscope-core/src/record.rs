//! File identity records and column tagging.

use std::ops::{Index, IndexMut};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// One of the two replicated trees under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
pub enum Column {
    /// Source side (downloads).
    #[strum(to_string = "A", serialize = "a")]
    A,
    /// Destination side (media library).
    #[strum(to_string = "B", serialize = "b")]
    B,
}

impl Column {
    /// Both columns, in traversal order.
    pub const ALL: [Column; 2] = [Column::A, Column::B];

    /// The opposite column.
    pub fn other(self) -> Self {
        match self {
            Column::A => Column::B,
            Column::B => Column::A,
        }
    }
}

/// Selects which column(s) an operation applies to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ColumnSelector {
    /// Column A only.
    #[default]
    A,
    /// Column B only.
    B,
    /// Both columns.
    Both,
}

impl ColumnSelector {
    /// Check whether the selector covers a column.
    pub fn includes(self, column: Column) -> bool {
        match self {
            ColumnSelector::A => column == Column::A,
            ColumnSelector::B => column == Column::B,
            ColumnSelector::Both => true,
        }
    }

    /// The selected columns, in traversal order.
    pub fn columns(self) -> impl Iterator<Item = Column> {
        Column::ALL.into_iter().filter(move |c| self.includes(*c))
    }
}

/// A value held once per column, indexable by [`Column`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerColumn<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
}

impl<T> PerColumn<T> {
    /// Create a pair from both column values.
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    /// Transform both values.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> PerColumn<U> {
        PerColumn::new(f(self.a), f(self.b))
    }
}

impl<T> Index<Column> for PerColumn<T> {
    type Output = T;

    fn index(&self, column: Column) -> &T {
        match column {
            Column::A => &self.a,
            Column::B => &self.b,
        }
    }
}

impl<T> IndexMut<Column> for PerColumn<T> {
    fn index_mut(&mut self, column: Column) -> &mut T {
        match column {
            Column::A => &mut self.a,
            Column::B => &mut self.b,
        }
    }
}

/// Filesystem identity of a file: `(device, inode)`.
///
/// Two paths with the same key are hard links to the same data. Identity is
/// only meaningful within one host, since device ids are local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InodeKey {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl InodeKey {
    /// Create a new identity key.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }

    /// Read the identity from file metadata.
    #[cfg(unix)]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self::new(metadata.dev(), metadata.ino())
    }

    #[cfg(not(unix))]
    pub fn from_metadata(_metadata: &std::fs::Metadata) -> Self {
        Self::new(0, 0) // no stable inode identity off unix
    }
}

/// A file visited during traversal. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Full path as reached from the configured root.
    #[serde(serialize_with = "crate::lossy::path")]
    pub path: PathBuf,
    /// Column the root belongs to.
    pub column: Column,
    /// Filesystem identity.
    pub key: InodeKey,
}

impl FileRecord {
    /// Create a new record.
    pub fn new(path: impl Into<PathBuf>, column: Column, key: InodeKey) -> Self {
        Self {
            path: path.into(),
            column,
            key,
        }
    }

    /// The directory containing this file.
    pub fn parent(&self) -> Option<&Path> {
        self.path.parent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_parse() {
        assert_eq!("a".parse::<ColumnSelector>().unwrap(), ColumnSelector::A);
        assert_eq!("BOTH".parse::<ColumnSelector>().unwrap(), ColumnSelector::Both);
        assert!("c".parse::<ColumnSelector>().is_err());
        assert_eq!(ColumnSelector::Both.to_string(), "both");
    }

    #[test]
    fn test_selector_columns() {
        assert_eq!(ColumnSelector::A.columns().collect::<Vec<_>>(), vec![Column::A]);
        assert_eq!(
            ColumnSelector::Both.columns().collect::<Vec<_>>(),
            vec![Column::A, Column::B]
        );
        assert!(!ColumnSelector::B.includes(Column::A));
    }

    #[test]
    fn test_per_column_index() {
        let mut pair = PerColumn::new(1, 2);
        pair[Column::B] += 10;
        assert_eq!(pair[Column::A], 1);
        assert_eq!(pair[Column::B], 12);
        assert_eq!(Column::A.other(), Column::B);
    }
}
