//! Lossy path serialization.
//!
//! serde refuses paths that are not valid UTF-8, which would fail a whole
//! result over one odd file name. These helpers write such paths with
//! invalid bytes replaced by U+FFFD. Deserialization stays the default.
//!
//! ```rust
//! use std::path::PathBuf;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Entry {
//!     #[serde(serialize_with = "linkscope_core::lossy::path")]
//!     path: PathBuf,
//! }
//! ```

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};

use crate::record::PerColumn;
use crate::result::SyncedFolders;

/// Serialize one path.
pub fn path<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.to_string_lossy())
}

/// Serialize a list of paths.
pub fn paths<S: Serializer>(paths: &[PathBuf], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(paths.iter().map(|p| p.to_string_lossy()))
}

/// Serialize the optional per-column folder sets.
pub fn folders<S: Serializer>(
    folders: &Option<SyncedFolders>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    fn lossy(paths: &[PathBuf]) -> Vec<Cow<'_, str>> {
        paths.iter().map(|p| p.to_string_lossy()).collect()
    }

    folders
        .as_ref()
        .map(|f| PerColumn::new(lossy(&f.a), lossy(&f.b)))
        .serialize(serializer)
}
