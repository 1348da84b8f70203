use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::namer::validate_base_name;
use crate::core::scan::ScanOrder;

/// Range offered when neither the command line nor the settings file gives one.
pub const DEFAULT_RANGE: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Used by `rename` when no base name is passed.
    pub base_name: Option<String>,
    /// Used by `dedup-range` when no range is passed.
    pub range: f64,
    pub scan_order: ScanOrder,
    /// Append a record to `<dir>/.history.jsonl` after each mutating run.
    pub history: bool,
    /// Show a spinner while scanning.
    pub progress: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_name: None,
            range: DEFAULT_RANGE,
            scan_order: ScanOrder::Sorted,
            history: true,
            progress: true,
        }
    }
}

impl Settings {
    /// `<config dir>/jsonsweep/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("jsonsweep").join("settings.json"))
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {:?}", path))?;
        let settings: Settings = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings {:?}", path))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        fs::write(path, serde_json::to_string_pretty(self)? + "\n")
            .with_context(|| format!("Failed to write settings {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_range(self.range)?;
        if let Some(base) = &self.base_name {
            validate_base_name(base).map_err(anyhow::Error::msg)?;
        }
        Ok(())
    }
}

pub fn validate_range(range: f64) -> Result<()> {
    if !range.is_finite() || range <= 0.0 {
        bail!("range must be a positive number, got {}", range);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load(&temp_dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.range, 40.0);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        fs::write(&path, r#"{"base_name": "crate", "scan_order": "filesystem"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.base_name.as_deref(), Some("crate"));
        assert_eq!(settings.scan_order, ScanOrder::Filesystem);
        assert_eq!(settings.range, DEFAULT_RANGE);
        assert!(settings.history);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");

        fs::write(&path, r#"{"range": 0}"#).unwrap();
        assert!(Settings::load(&path).is_err());

        fs::write(&path, r#"{"base_name": ""}"#).unwrap();
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("settings.json");
        let settings = Settings {
            range: 12.5,
            ..Default::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }
}
