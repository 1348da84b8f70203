use crate::core::RunOptions;
use crate::core::record::WriteMode;
use crate::core::report::{RenameSummary, Reporter};
use crate::core::scan::{self, JSON_SUFFIX, ScanOptions, ScanOrder};
use crate::error::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix handed out when no `<base>_<N>.json` exists yet.
pub const FIRST_SUFFIX: u64 = 100;

/// Written into `description` of every renamed file, replacing whatever was there.
pub const GENERATED_DESCRIPTION: &str = "new_description";

/// A base name must be non-empty and must not escape the target directory.
pub fn validate_base_name(base_name: &str) -> std::result::Result<(), String> {
    if base_name.is_empty() {
        return Err("base name must not be empty".to_string());
    }
    if base_name.contains(['/', '\\']) || base_name == "." || base_name == ".." {
        return Err(format!("base name {:?} must be a plain file name", base_name));
    }
    Ok(())
}

/// `N` from `<base_name>_<N>.json`, or None if the name does not follow that shape.
pub fn parse_suffix(file_name: &str, base_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(base_name)?
        .strip_prefix('_')?
        .strip_suffix(JSON_SUFFIX)?
        .parse()
        .ok()
}

/// One past the highest conforming suffix, never below [`FIRST_SUFFIX`].
pub fn next_suffix<'a>(file_names: impl IntoIterator<Item = &'a str>, base_name: &str) -> u64 {
    file_names
        .into_iter()
        .filter_map(|name| parse_suffix(name, base_name))
        .fold(FIRST_SUFFIX, |next, n| next.max(n.saturating_add(1)))
}

pub fn generated_name(base_name: &str, suffix: u64) -> String {
    format!("{}_{}", base_name, suffix)
}

/// Give every `.json` file in `dir` whose name does not start with
/// `base_name` a generated name, in path order.
///
/// Each renamed file gets `name` set to its new stem and `description`
/// overwritten with [`GENERATED_DESCRIPTION`]. The replacement is written
/// before the original is removed; a file whose processing fails is left as
/// it was.
pub fn rename_batch(
    dir: &Path,
    base_name: &str,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
) -> Result<RenameSummary> {
    rename_batch_with(dir, base_name, options, reporter, &|path| fs::remove_file(path))
}

/// [`rename_batch`] with the removal of originals supplied by the caller.
fn rename_batch_with(
    dir: &Path,
    base_name: &str,
    options: &RunOptions,
    reporter: &mut dyn Reporter,
    remove_original: &dyn Fn(&Path) -> io::Result<()>,
) -> Result<RenameSummary> {
    let _lock = options.prepare(dir)?;

    let scan_options = ScanOptions {
        order: ScanOrder::Sorted,
        ..options.scan
    };
    let files = scan::list_json_files(dir, &scan_options)?;

    let (existing, pending): (Vec<PathBuf>, Vec<PathBuf>) = files
        .into_iter()
        .partition(|path| file_name_str(path).starts_with(base_name));

    let mut suffix = next_suffix(existing.iter().map(|p| file_name_str(p)), base_name);
    log::debug!(
        "{} existing '{}' files, starting at suffix {}",
        existing.len(),
        base_name,
        suffix
    );

    let mut summary = RenameSummary {
        first_suffix: suffix,
        dry_run: options.dry_run,
        ..Default::default()
    };

    for (path, loaded) in pending.iter().zip(scan::load_all(&pending)) {
        let mut record = match loaded {
            Ok(candidate) => candidate.record,
            Err(err) => {
                reporter.line(format!("Error processing file: {}: {}", path.display(), err));
                summary.failed += 1;
                continue;
            }
        };
        if !record.is_object() {
            log::debug!("Skipping {}: root is not an object", path.display());
            summary.skipped += 1;
            continue;
        }

        let new_name = generated_name(base_name, suffix);
        record.set_description(GENERATED_DESCRIPTION);
        record.set_name(&new_name);
        let new_path = dir.join(format!("{}{}", new_name, JSON_SUFFIX));

        if options.dry_run {
            reporter.line(format!(
                "[dry-run] Would update and rename {} → {}",
                path.display(),
                new_path.display()
            ));
            summary.renamed.push((path.clone(), new_path));
            suffix += 1;
            continue;
        }

        if let Err(err) = record.save(&new_path, WriteMode::CreateNew) {
            reporter.line(format!("Error processing file: {}: {}", path.display(), err));
            summary.failed += 1;
            continue;
        }
        if let Err(err) = remove_original(path) {
            // Roll back so the original stays the only copy.
            if let Err(cleanup) = fs::remove_file(&new_path) {
                log::warn!("Failed to remove {}: {}", new_path.display(), cleanup);
            }
            reporter.line(format!("Error processing file: {}: {}", path.display(), err));
            summary.failed += 1;
            continue;
        }

        reporter.line(format!("Updated and renamed file: {}", new_path.display()));
        summary.renamed.push((path.clone(), new_path));
        suffix += 1;
    }

    reporter.line("Processing complete!".to_string());
    reporter.line(format!(
        "{} {} file(s), skipped {}, failed {}",
        if options.dry_run { "Would rename" } else { "Renamed" },
        summary.renamed.len(),
        summary.skipped,
        summary.failed
    ));
    Ok(summary)
}

fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}
