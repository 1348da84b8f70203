use crate::error::{Result, SweepError};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const POSITION_KEY: &str = "position";
pub const NAME_KEY: &str = "name";
pub const DESCRIPTION_KEY: &str = "description";

/// X, Y, Z as stored in the `position` array.
pub type Position = (f64, f64, f64);

/// Format `value` with two decimals, rounding the shortest decimal form of the
/// number half-up (away from zero): `1.005` gives `1.01`, not the `1.00` its
/// binary expansion would round to.
pub fn format_2dp(value: f64) -> String {
    format_half_up(value, 2)
}

fn format_half_up(value: f64, places: usize) -> String {
    // `Display` for f64 is the shortest round-trip form and never uses exponents.
    let shortest = format!("{}", value.abs());
    let (int_part, frac_part) = shortest.split_once('.').unwrap_or((shortest.as_str(), ""));

    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().chain(std::iter::repeat(b'0')).take(places))
        .collect();

    if frac_part.as_bytes().get(places).is_some_and(|&d| d >= b'5') {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - places;
    let mut out = String::with_capacity(digits.len() + 2);
    if value.is_sign_negative() {
        out.push('-');
    }
    out.extend(digits[..split].iter().map(|&d| d as char));
    if places > 0 {
        out.push('.');
        out.extend(digits[split..].iter().map(|&d| d as char));
    }
    out
}

/// How [`JsonRecord::save`] treats an existing file at the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Atomically replace whatever is there.
    Overwrite,
    /// Fail if the target already exists.
    CreateNew,
}

/// A parsed JSON document. Key order is preserved on rewrite, and keys this
/// crate does not understand pass through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    root: Value,
}

impl JsonRecord {
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let parse_err = |source: serde_json::Error| SweepError::Parse {
            path: path.to_path_buf(),
            source,
        };
        let bytes = fs::read(path).map_err(|e| parse_err(serde_json::Error::io(e)))?;
        let root = serde_json::from_slice(&bytes).map_err(parse_err)?;
        Ok(Self { root })
    }

    /// Pretty-print the document to `path` through a temp file in the same
    /// directory, so readers never observe a half-written file.
    pub fn save(&self, path: &Path, mode: WriteMode) -> Result<()> {
        let write_err = |source: std::io::Error| SweepError::Write {
            path: path.to_path_buf(),
            source,
        };
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        serde_json::to_writer_pretty(&mut tmp, &self.root).map_err(|e| write_err(e.into()))?;
        tmp.write_all(b"\n").map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        match mode {
            WriteMode::Overwrite => tmp.persist(path).map_err(|e| write_err(e.error))?,
            WriteMode::CreateNew => tmp.persist_noclobber(path).map_err(|e| write_err(e.error))?,
        };
        Ok(())
    }

    pub fn is_object(&self) -> bool {
        self.root.is_object()
    }

    pub fn has_position(&self) -> bool {
        self.root.get(POSITION_KEY).is_some()
    }

    /// Read `position` as (X, Y, Z). Extra elements past the third are ignored.
    pub fn position(&self, path: &Path) -> Result<Position> {
        let invalid = |reason: &str| SweepError::InvalidPosition {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let value = self
            .root
            .get(POSITION_KEY)
            .ok_or_else(|| SweepError::MissingPosition {
                path: path.to_path_buf(),
            })?;
        let items = value.as_array().ok_or_else(|| invalid("not an array"))?;
        if items.len() < 3 {
            return Err(invalid("fewer than 3 elements"));
        }

        let coord = |i: usize| {
            items[i]
                .as_f64()
                .ok_or_else(|| invalid(&format!("element {} is not a number", i)))
        };
        Ok((coord(0)?, coord(1)?, coord(2)?))
    }

    pub fn name(&self) -> Option<&str> {
        self.root.get(NAME_KEY).and_then(Value::as_str)
    }

    pub fn description(&self) -> Option<&str> {
        self.root.get(DESCRIPTION_KEY).and_then(Value::as_str)
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        self.set_string(NAME_KEY, name)
    }

    pub fn set_description(&mut self, description: &str) -> bool {
        self.set_string(DESCRIPTION_KEY, description)
    }

    /// Returns false when the root is not an object and nothing was set.
    fn set_string(&mut self, key: &str, value: &str) -> bool {
        match self.root.as_object_mut() {
            Some(map) => {
                map.insert(key.to_string(), Value::String(value.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.root.as_object()
    }
}

/// A file picked up by a directory scan together with its parsed contents.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub record: JsonRecord,
}

/// The part of a [`CandidateFile`] the deduplicators look at.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionEntry {
    pub path: PathBuf,
    pub position: Position,
}

impl PositionEntry {
    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
