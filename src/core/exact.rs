use crate::core::record::{CandidateFile, Position, PositionEntry, file_name, format_2dp};
use crate::core::report::{DedupSummary, Reporter};
use crate::core::scan;
use crate::core::{Disposal, RunOptions};
use crate::error::{Result, SweepError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Round each component to 2 decimals and join with commas, e.g. `1.00,2.00,3.00`.
///
/// Positions that only differ past the second decimal share a key. Ties round
/// half-up on the written decimal, so `1.005` keys as `1.01`.
pub fn position_key(position: &Position) -> String {
    let &(x, y, z) = position;
    format!("{},{},{}", format_2dp(x), format_2dp(y), format_2dp(z))
}

/// Files sharing one position key, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub key: String,
    pub files: Vec<PathBuf>,
}

impl Bucket {
    pub fn is_duplicate(&self) -> bool {
        self.files.len() > 1
    }
}

/// Group entries by [`position_key`]. Buckets come out in the order their key
/// was first seen.
pub fn bucket(entries: &[PositionEntry]) -> Vec<Bucket> {
    let mut buckets: Vec<Bucket> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let key = position_key(&entry.position);
        match index.get(&key) {
            Some(&i) => buckets[i].files.push(entry.path.clone()),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket {
                    key,
                    files: vec![entry.path.clone()],
                });
            }
        }
    }
    buckets
}

/// Read every `.json` file's position, logging each key. Missing positions
/// are warned about and left out.
fn collect_positions(
    dir: &Path,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
    summary: &mut DedupSummary,
) -> Result<Vec<PositionEntry>> {
    let files = scan::list_json_files(dir, &options.scan)?;
    let mut entries = Vec::with_capacity(files.len());

    for loaded in scan::load_all(&files) {
        let CandidateFile { path, record } = match loaded {
            Ok(candidate) => candidate,
            Err(err) => {
                reporter.line(err.to_string());
                summary.skipped += 1;
                continue;
            }
        };
        match record.position(&path) {
            Ok(position) => {
                reporter.line(format!(
                    "File: {} Position: {}",
                    file_name(&path),
                    position_key(&position)
                ));
                entries.push(PositionEntry { path, position });
            }
            Err(SweepError::MissingPosition { .. }) => {
                reporter.line(format!("Warning: No position found in {}", file_name(&path)));
            }
            Err(err) => {
                reporter.line(err.to_string());
                summary.skipped += 1;
            }
        }
    }
    Ok(entries)
}

/// Delete all but the first file of every group whose positions round to the
/// same 2-decimal key.
pub fn dedup_exact(
    dir: &Path,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
) -> Result<DedupSummary> {
    let _lock = options.prepare(dir)?;

    let mut summary = DedupSummary {
        dry_run: options.dry_run,
        ..Default::default()
    };
    reporter.line(String::new());
    reporter.line("=== Starting Duplicate Position Check ===".to_string());

    let entries = collect_positions(dir, options, reporter, &mut summary)?;
    let buckets = bucket(&entries);
    summary.checked = buckets.iter().map(|b| b.files.len()).sum();

    reporter.line(String::new());
    reporter.line("=== Exact Duplicate Position Check Results ===".to_string());

    let duplicates: Vec<&Bucket> = buckets.iter().filter(|b| b.is_duplicate()).collect();
    for group in &duplicates {
        summary.kept.push(group.files[0].clone());
        summary.planned.extend(group.files[1..].iter().cloned());
    }

    if duplicates.is_empty() {
        reporter.line(String::new());
        reporter.line("No exact duplicate positions found!".to_string());
        reporter.line("Positions found:".to_string());
        for b in &buckets {
            reporter.line(format!("  {} : {}", b.key, file_name(&b.files[0])));
        }
    } else {
        let planned = summary.planned.clone();
        let disposal = Disposal::decide(options, &planned, reporter);
        for group in &duplicates {
            reporter.line(String::new());
            reporter.line(format!("Duplicate position found: {}", group.key));
            reporter.line("Files with this position:".to_string());
            for path in &group.files {
                reporter.line(format!("  - {}", file_name(path)));
            }
            reporter.line(String::new());
            reporter.line(format!("Keeping file: {}", file_name(&group.files[0])));
            reporter.line("Deleting duplicates:".to_string());
            for path in &group.files[1..] {
                disposal.apply(path, reporter, &mut summary);
            }
        }
    }

    reporter.line(String::new());
    reporter.line(format!("Total files checked: {}", summary.checked));
    if !summary.planned.is_empty() {
        reporter.line(format!(
            "{} {} of {} duplicate file(s)",
            if options.dry_run { "Would delete" } else { "Deleted" },
            if options.dry_run { summary.planned.len() } else { summary.deleted.len() },
            summary.planned.len()
        ));
    }
    if summary.skipped > 0 || summary.failed > 0 {
        reporter.line(format!(
            "Skipped {} unreadable file(s), {} deletion(s) failed",
            summary.skipped, summary.failed
        ));
    }
    Ok(summary)
}
