use crate::core::record::{CandidateFile, JsonRecord};
use crate::error::{Result, SweepError};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

pub const JSON_SUFFIX: &str = ".json";

/// Order in which scanned files are visited. "Keep first" decisions depend on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ScanOrder {
    /// Lexicographic by path.
    #[default]
    Sorted,
    /// Whatever order the platform's directory listing returns.
    Filesystem,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub order: ScanOrder,
    pub show_progress: bool,
}

/// Fail with [`SweepError::DirectoryAccess`] unless `dir` can be listed.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    fs::read_dir(dir)
        .map(|_| ())
        .map_err(|source| SweepError::DirectoryAccess {
            path: dir.to_path_buf(),
            source,
        })
}

/// List regular `*.json` files directly inside `dir` (no recursion).
pub fn list_json_files(dir: &Path, options: &ScanOptions) -> Result<Vec<PathBuf>> {
    ensure_directory(dir)?;

    let spinner = if options.show_progress {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Scanning for JSON files…");
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    } else {
        ProgressBar::hidden()
    };

    let mut walker = WalkDir::new(dir).min_depth(1).max_depth(1);
    if options.order == ScanOrder::Sorted {
        walker = walker.sort_by_file_name();
    }

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // depth 0 means the directory itself could not be read
            Err(err) if err.depth() == 0 => {
                spinner.finish_and_clear();
                return Err(SweepError::DirectoryAccess {
                    path: dir.to_path_buf(),
                    source: err.into(),
                });
            }
            Err(err) => {
                log::debug!("Skipping unreadable entry in {}: {}", dir.display(), err);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && has_json_suffix(path) {
            files.push(path.to_path_buf());
        }
        spinner.tick();
    }

    spinner.finish_and_clear();
    log::debug!("Found {} JSON files in {}", files.len(), dir.display());
    Ok(files)
}

/// Matches on the raw file name, so `a.JSON` is not picked up.
pub fn has_json_suffix(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(JSON_SUFFIX))
}

/// Parse every path in parallel. The output is in the same order as `paths`.
pub fn load_all(paths: &[PathBuf]) -> Vec<Result<CandidateFile>> {
    paths
        .par_iter()
        .map(|path| {
            JsonRecord::load(path).map(|record| CandidateFile {
                path: path.clone(),
                record,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lists_only_top_level_json_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("a.json"), "{}").unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "x").unwrap();
        fs::write(temp_dir.path().join("upper.JSON"), "{}").unwrap();
        fs::write(temp_dir.path().join(".history.jsonl"), "").unwrap();
        fs::create_dir(temp_dir.path().join("nested.json")).unwrap();
        fs::write(temp_dir.path().join("nested.json").join("c.json"), "{}").unwrap();

        let files = list_json_files(temp_dir.path(), &ScanOptions::default()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_filesystem_order_lists_the_same_files() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["c.json", "a.json", "b.json", "skip.txt"] {
            fs::write(temp_dir.path().join(name), "{}").unwrap();
        }
        fs::create_dir(temp_dir.path().join("dir.json")).unwrap();

        let sorted = list_json_files(temp_dir.path(), &ScanOptions::default()).unwrap();
        let options = ScanOptions {
            order: ScanOrder::Filesystem,
            ..Default::default()
        };
        let mut unsorted = list_json_files(temp_dir.path(), &options).unwrap();
        assert_eq!(unsorted.len(), 3);

        unsorted.sort();
        assert_eq!(unsorted, sorted);
    }

    #[test]
    fn test_missing_directory_is_directory_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let result = list_json_files(&missing, &ScanOptions::default());
        assert!(matches!(result, Err(SweepError::DirectoryAccess { .. })));
    }

    #[test]
    fn test_file_path_is_directory_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.json");
        fs::write(&file, "{}").unwrap();

        assert!(matches!(
            ensure_directory(&file),
            Err(SweepError::DirectoryAccess { .. })
        ));
    }

    #[test]
    fn test_load_all_keeps_order() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("a.json");
        let bad = temp_dir.path().join("b.json");
        let also_good = temp_dir.path().join("c.json");
        fs::write(&good, r#"{"position":[1,2,3]}"#).unwrap();
        fs::write(&bad, "nope").unwrap();
        fs::write(&also_good, "{}").unwrap();

        let loaded = load_all(&[good.clone(), bad.clone(), also_good.clone()]);
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].as_ref().unwrap().path, good);
        assert!(matches!(loaded[1], Err(SweepError::Parse { ref path, .. }) if *path == bad));
        assert_eq!(loaded[2].as_ref().unwrap().path, also_good);
    }
}
