use crate::core::record::{CandidateFile, Position, PositionEntry, format_2dp};
use crate::core::report::{DedupSummary, Reporter};
use crate::core::scan;
use crate::core::{Disposal, RunOptions};
use crate::error::{Result, SweepError};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Distance on the horizontal plane. Y (height) is ignored.
pub fn xz_distance(a: &Position, b: &Position) -> f64 {
    let dx = a.0 - b.0;
    let dz = a.2 - b.2;
    (dx * dx + dz * dz).sqrt()
}

/// A pair of entries closer than the range, by index into the scanned entries.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosePair {
    pub first: usize,
    pub second: usize,
    pub distance: f64,
    /// False when `first` was itself already marked, so this pair marked nothing.
    pub marked_second: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProximityPlan {
    pub pairs: Vec<ClosePair>,
    /// Indices marked for deletion, in the order they were first marked.
    pub marked: Vec<usize>,
}

/// Compare every pair `i < j` in scan order. The earlier file of a close pair
/// is kept and the later one marked, unless the earlier one is already marked.
pub fn plan(entries: &[PositionEntry], range: f64) -> ProximityPlan {
    let mut plan = ProximityPlan::default();
    let mut marked: HashSet<usize> = HashSet::new();

    for i in 0..entries.len() {
        for j in (i + 1)..entries.len() {
            let distance = xz_distance(&entries[i].position, &entries[j].position);
            if distance >= range {
                continue;
            }
            let marked_second = !marked.contains(&i);
            if marked_second && marked.insert(j) {
                plan.marked.push(j);
            }
            plan.pairs.push(ClosePair {
                first: i,
                second: j,
                distance,
                marked_second,
            });
        }
    }
    plan
}

/// Read every `.json` file's position. Files without `position` are left out
/// quietly; unreadable files and malformed positions are logged.
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
            Ok(position) => entries.push(PositionEntry { path, position }),
            Err(SweepError::MissingPosition { .. }) => {
                log::debug!("No position in {}", path.display());
            }
            Err(err) => {
                reporter.line(err.to_string());
                summary.skipped += 1;
            }
        }
    }
    Ok(entries)
}

fn describe(entry: &PositionEntry) -> String {
    let (x, y, z) = entry.position;
    format!(
        "{} [{}, {}, {}]",
        entry.file_name(),
        format_2dp(x),
        format_2dp(y),
        format_2dp(z)
    )
}

/// Delete every file that lies within `range` (XZ plane) of an earlier file.
pub fn dedup_by_range(
    dir: &Path,
    range: f64,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
) -> Result<DedupSummary> {
    let _lock = options.prepare(dir)?;

    let mut summary = DedupSummary {
        dry_run: options.dry_run,
        ..Default::default()
    };
    let entries = collect_positions(dir, options, reporter, &mut summary)?;
    summary.checked = entries.len();

    reporter.line(String::new());
    reporter.line("=== Position Range Check Results ===".to_string());
    reporter.line(format!("Checking for positions within {:?} units of each other", range));
    reporter.line("Comparing only X and Z coordinates (ignoring Y/height)".to_string());

    let plan = plan(&entries, range);
    for pair in &plan.pairs {
        let first = &entries[pair.first];
        let second = &entries[pair.second];
        reporter.line(String::new());
        reporter.line(format!(
            "Found close positions (XZ distance: {}):",
            format_2dp(pair.distance)
        ));
        if pair.marked_second {
            reporter.line(format!("Keeping: {}", describe(first)));
            reporter.line(format!("Will delete: {}", describe(second)));
        } else {
            reporter.line(format!("Already marked for deletion: {}", describe(first)));
            reporter.line(format!("Not marked by this pair: {}", describe(second)));
        }
    }

    let mut kept: Vec<PathBuf> = Vec::new();
    for pair in plan.pairs.iter().filter(|p| p.marked_second) {
        let path = &entries[pair.first].path;
        if !kept.contains(path) {
            kept.push(path.clone());
        }
    }
    summary.kept = kept;
    summary.planned = plan.marked.iter().map(|&i| entries[i].path.clone()).collect();

    if summary.planned.is_empty() {
        reporter.line(String::new());
        reporter.line(format!(
            "No files found within {:?} units of each other (XZ plane)",
            range
        ));
    } else {
        reporter.line(String::new());
        reporter.line("Deleting files:".to_string());
        let planned = summary.planned.clone();
        let disposal = Disposal::decide(options, &planned, reporter);
        for path in &planned {
            disposal.apply(path, reporter, &mut summary);
        }
        reporter.line(String::new());
        match disposal {
            Disposal::DryRun => {
                reporter.line(format!("Would delete {} files", planned.len()));
            }
            _ => reporter.line(format!("Deleted {} files", summary.deleted.len())),
        }
    }

    reporter.line(String::new());
    reporter.line(format!("Total files checked: {}", summary.checked));
    if summary.skipped > 0 || summary.failed > 0 {
        reporter.line(format!(
            "Skipped {} unreadable file(s), {} deletion(s) failed",
            summary.skipped, summary.failed
        ));
    }
    Ok(summary)
}
