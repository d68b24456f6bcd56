//! Two-column link scanner.

use std::time::Instant;

use rayon::prelude::*;

use linkscope_core::{Column, ColumnSelector, PathError, ScanConfig, ScanError, ScanResult};

use crate::folder::FolderAggregator;
use crate::index::InodeIndex;
use crate::progress::TraversalContext;
use crate::traverser::{PathTraverser, count_root};

/// Scans both columns of a configuration and classifies their files.
#[derive(Debug, Clone, Default)]
pub struct LinkScanner {
    ctx: TraversalContext,
}

impl LinkScanner {
    /// Create a scanner with no progress reporting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner reporting into a traversal context.
    pub fn with_context(ctx: TraversalContext) -> Self {
        Self { ctx }
    }

    /// The traversal context in use.
    pub fn context(&self) -> &TraversalContext {
        &self.ctx
    }

    /// Walk column A, then column B, grouping every file by identity.
    ///
    /// Returns the index together with all non-fatal errors. Fails only when
    /// the traversal is cancelled.
    pub fn index(&self, config: &ScanConfig) -> Result<(InodeIndex, Vec<PathError>), ScanError> {
        let traverser = PathTraverser::new(config, &self.ctx);
        let mut index = InodeIndex::new();
        let mut errors = Vec::new();

        for column in Column::ALL {
            let mut walk = traverser.walk(column);
            index.extend(&mut walk);
            errors.extend(walk.finish()?);
        }

        Ok((index, errors))
    }

    /// File-level scan: every file must be linked on its own.
    pub fn scan_files(&self, config: &ScanConfig) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        let (index, errors) = self.index(config)?;

        let mut result = index.classify();
        result.errors = errors;

        log_summary("file", &index, &result, start);
        Ok(result)
    }

    /// Folder-level scan: a folder is linked once any file in it is linked.
    pub fn scan_folders(
        &self,
        config: &ScanConfig,
        check: ColumnSelector,
    ) -> Result<ScanResult, ScanError> {
        let start = Instant::now();
        let (index, errors) = self.index(config)?;

        let mut result = FolderAggregator::new(config, check).aggregate(&index);
        result.errors = errors;

        log_summary("folder", &index, &result, start);
        Ok(result)
    }

    /// Count the files a scan of this configuration would visit.
    ///
    /// Missing roots count as zero.
    pub fn count_files(config: &ScanConfig) -> u64 {
        let roots: Vec<_> = Column::ALL
            .iter()
            .flat_map(|c| config.roots(*c))
            .collect();
        roots.par_iter().map(|root| count_root(config, root)).sum()
    }
}

fn log_summary(mode: &str, index: &InodeIndex, result: &ScanResult, start: Instant) {
    tracing::info!(
        mode,
        files = index.record_count(),
        identities = index.len(),
        synced = result.synced.len(),
        orphans_a = result.orphans_a.len(),
        orphans_b = result.orphans_b.len(),
        conflicts = result.conflicts.len(),
        errors = result.errors.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "scan finished"
    );
}
