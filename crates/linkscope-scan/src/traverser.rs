//! Depth-bounded traversal of one column's roots.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use jwalk::{DirEntry, Parallelism, WalkDir};

use linkscope_core::{Column, FileRecord, InodeKey, PathError, ScanConfig, ScanError};

use crate::progress::TraversalContext;

type EntryIter = Box<dyn Iterator<Item = Result<DirEntry<((), ())>, jwalk::Error>>>;

/// Walks the roots of a column and yields a [`FileRecord`] per file.
#[derive(Debug, Clone, Copy)]
pub struct PathTraverser<'a> {
    config: &'a ScanConfig,
    ctx: &'a TraversalContext,
}

impl<'a> PathTraverser<'a> {
    /// Create a traverser over a scan configuration.
    pub fn new(config: &'a ScanConfig, ctx: &'a TraversalContext) -> Self {
        Self { config, ctx }
    }

    /// Start a lazy walk of every root in a column.
    pub fn walk(&self, column: Column) -> Traversal<'a> {
        Traversal {
            column,
            config: self.config,
            ctx: self.ctx,
            roots: self.config.roots(column).iter(),
            current: None,
            errors: Vec::new(),
            cancelled: false,
        }
    }
}

/// A lazy, finite walk over one column.
///
/// Failures never end the walk: they accumulate and are returned by
/// [`Traversal::finish`]. Only cancellation stops it early.
pub struct Traversal<'a> {
    column: Column,
    config: &'a ScanConfig,
    ctx: &'a TraversalContext,
    roots: std::slice::Iter<'a, PathBuf>,
    current: Option<EntryIter>,
    errors: Vec<PathError>,
    cancelled: bool,
}

impl Traversal<'_> {
    /// End the walk and take its errors.
    pub fn finish(self) -> Result<Vec<PathError>, ScanError> {
        if self.cancelled {
            Err(ScanError::Cancelled)
        } else {
            Ok(self.errors)
        }
    }

    fn open_root(&mut self, root: &Path) -> Option<EntryIter> {
        match fs::metadata(root) {
            Ok(metadata) if metadata.is_dir() => {
                let walker = configure_walk(self.config, root, parallelism(self.config.threads));
                Some(Box::new(walker.into_iter()))
            }
            Ok(_) => {
                self.errors.push(
                    ScanError::NotADirectory {
                        path: root.to_path_buf(),
                    }
                    .into(),
                );
                None
            }
            Err(err) => {
                let err = ScanError::root(root, err);
                tracing::warn!(column = %self.column, %err, "skipping root");
                self.errors.push(err.into());
                None
            }
        }
    }

    fn visit(&mut self, entry: DirEntry<((), ())>) -> Option<FileRecord> {
        if entry.depth() == 0 || entry.file_type().is_dir() {
            return None;
        }

        let path = entry.path();
        let metadata = fs::metadata(&path);

        // Symlinked directories are listed but never descended.
        if matches!(&metadata, Ok(m) if m.is_dir()) {
            return None;
        }

        self.ctx.record_file(self.column, &path);

        match metadata {
            Ok(metadata) => Some(FileRecord::new(
                path,
                self.column,
                InodeKey::from_metadata(&metadata),
            )),
            Err(err) => {
                let err = ScanError::stat(&path, err);
                if !err.is_vanished() {
                    self.errors.push(err.into());
                }
                None
            }
        }
    }
}

impl Iterator for Traversal<'_> {
    type Item = FileRecord;

    fn next(&mut self) -> Option<FileRecord> {
        loop {
            if self.cancelled {
                return None;
            }
            if self.ctx.is_cancelled() {
                self.cancelled = true;
                self.current = None;
                return None;
            }

            let Some(walk) = self.current.as_mut() else {
                let root = self.roots.next()?;
                self.current = self.open_root(root);
                continue;
            };

            match walk.next() {
                None => self.current = None,
                Some(Err(err)) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    self.errors.push(
                        ScanError::ReadDir {
                            path,
                            message: err.to_string(),
                        }
                        .into(),
                    );
                }
                Some(Ok(entry)) => {
                    if let Some(record) = self.visit(entry) {
                        return Some(record);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for Traversal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("column", &self.column)
            .field("errors", &self.errors.len())
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

/// Count the files a traversal would visit. Only symlinks are stat'ed.
pub(crate) fn count_root(config: &ScanConfig, root: &Path) -> u64 {
    if !root.is_dir() {
        return 0;
    }
    configure_walk(config, root, Parallelism::Serial)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.depth() > 0 && !e.file_type().is_dir())
        .filter(|e| !(e.file_type().is_symlink() && e.path().is_dir()))
        .count() as u64
}

fn configure_walk(config: &ScanConfig, root: &Path, parallelism: Parallelism) -> WalkDir {
    WalkDir::new(root)
        .parallelism(parallelism)
        .sort(true)
        .skip_hidden(!config.include_hidden)
        .follow_links(false)
        .min_depth(0)
        .max_depth(walk_depth(config.max_depth))
}

/// Files inside a directory at depth `d` sit at walk depth `d + 1`.
fn walk_depth(max_depth: Option<u32>) -> usize {
    max_depth.map_or(usize::MAX, |d| d as usize + 1)
}

fn parallelism(threads: usize) -> Parallelism {
    match threads {
        0 => Parallelism::RayonDefaultPool {
            busy_timeout: Duration::from_millis(100),
        },
        1 => Parallelism::Serial,
        n => Parallelism::RayonNewPool(n),
    }
}
