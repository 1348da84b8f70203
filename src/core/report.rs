use std::path::PathBuf;

/// Receives the human-readable log lines an operation produces, in order.
pub trait Reporter {
    fn line(&mut self, message: String);

    /// Asked once, right before planned deletions are applied. Returning
    /// false leaves every file in place.
    fn approve_deletions(&mut self, _planned: &[PathBuf]) -> bool {
        true
    }
}

/// Collects lines in memory.
impl Reporter for Vec<String> {
    fn line(&mut self, message: String) {
        self.push(message);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenameSummary {
    /// `(original, renamed)` pairs that were written and whose original was removed.
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Non-object roots, skipped without a log line.
    pub skipped: usize,
    pub failed: usize,
    /// The first suffix handed out in this run.
    pub first_suffix: u64,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupSummary {
    /// Files that had a usable position.
    pub checked: usize,
    /// Files kept because a later file duplicated them.
    pub kept: Vec<PathBuf>,
    /// Files marked for deletion, in marking order.
    pub planned: Vec<PathBuf>,
    pub deleted: Vec<PathBuf>,
    /// Files that failed to parse or had a malformed position.
    pub skipped: usize,
    /// Deletions that failed.
    pub failed: usize,
    pub dry_run: bool,
}

impl DedupSummary {
    pub fn changed_anything(&self) -> bool {
        !self.dry_run && !self.deleted.is_empty()
    }
}

impl RenameSummary {
    pub fn changed_anything(&self) -> bool {
        !self.dry_run && !self.renamed.is_empty()
    }
}
