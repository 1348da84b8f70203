use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::core::report::{DedupSummary, RenameSummary};
use crate::error::Result;

pub const HISTORY_FILE_NAME: &str = ".history.jsonl";

/// One line of `.history.jsonl`: what a single run changed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub operation: String, // "rename", "dedup-range" or "dedup-exact"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kept: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub renamed: Vec<(String, String)>,
}

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl HistoryRecord {
    pub fn from_rename(summary: &RenameSummary) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            operation: "rename".to_string(),
            kept: Vec::new(),
            removed: Vec::new(),
            renamed: summary
                .renamed
                .iter()
                .map(|(from, to)| (lossy(from), lossy(to)))
                .collect(),
        }
    }

    pub fn from_dedup(operation: &str, summary: &DedupSummary) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            kept: summary.kept.iter().map(|p| lossy(p)).collect(),
            removed: summary.deleted.iter().map(|p| lossy(p)).collect(),
            renamed: Vec::new(),
        }
    }
}

pub fn history_path(dir: &Path) -> PathBuf {
    dir.join(HISTORY_FILE_NAME)
}

pub fn append(dir: &Path, record: &HistoryRecord) -> Result<()> {
    let mut out = OpenOptions::new()
        .create(true)
        .append(true)
        .open(history_path(dir))?;
    writeln!(out, "{}", serde_json::to_string(record)?)?;
    Ok(())
}

/// Every line of the journal, in file order. Malformed lines come back as
/// their parse error so callers can report and skip them.
pub fn read(dir: &Path) -> Result<Vec<std::result::Result<HistoryRecord, serde_json::Error>>> {
    let reader = BufReader::new(File::open(history_path(dir))?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str::<HistoryRecord>(&line));
    }
    Ok(records)
}
