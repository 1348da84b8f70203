// File-set reconciliation:
// - sequential renaming with generated names
// - proximity deduplication on the XZ plane
// - exact deduplication on positions rounded to 2 decimals

pub mod exact;
pub mod namer;
pub mod proximity;
pub mod record;
pub mod report;
pub mod scan;

use crate::core::report::{DedupSummary, Reporter};
use crate::core::scan::ScanOptions;
use crate::error::{Result, SweepError};
use crate::lock::DirLock;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub scan: ScanOptions,
    /// Log every decision but leave the directory untouched.
    pub dry_run: bool,
}

impl RunOptions {
    /// Validate `dir` and, for mutating runs, take its lock when the directory
    /// allows one.
    pub(crate) fn prepare(&self, dir: &Path) -> Result<Option<DirLock>> {
        scan::ensure_directory(dir)?;
        if self.dry_run {
            Ok(None)
        } else {
            DirLock::acquire(dir)
        }
    }
}

/// What happens to files a deduplicator has marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Disposal {
    Delete,
    DryRun,
    Declined,
}

impl Disposal {
    pub(crate) fn decide(
        options: &RunOptions,
        planned: &[std::path::PathBuf],
        reporter: &mut dyn Reporter,
    ) -> Self {
        if options.dry_run {
            Disposal::DryRun
        } else if planned.is_empty() || reporter.approve_deletions(planned) {
            Disposal::Delete
        } else {
            reporter.line("Deletion declined; no files were deleted.".to_string());
            Disposal::Declined
        }
    }

    /// Apply this disposal to one marked file, logging the outcome.
    pub(crate) fn apply(self, path: &Path, reporter: &mut dyn Reporter, summary: &mut DedupSummary) {
        let name = record::file_name(path);
        match self {
            Disposal::Delete => match std::fs::remove_file(path) {
                Ok(()) => {
                    reporter.line(format!("  - Deleted: {}", name));
                    summary.deleted.push(path.to_path_buf());
                }
                Err(source) => {
                    let err = SweepError::Delete {
                        path: path.to_path_buf(),
                        source,
                    };
                    reporter.line(format!("  - Error deleting {}: {}", name, err));
                    summary.failed += 1;
                }
            },
            Disposal::DryRun => reporter.line(format!("  - [dry-run] Would delete: {}", name)),
            Disposal::Declined => {}
        }
    }
}
