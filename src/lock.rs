use crate::error::{Result, SweepError};
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const LOCK_FILE_NAME: &str = ".jsonsweep.lock";

/// Held for the duration of a mutating run. Only one run per directory may
/// hold it; the lock file is removed on drop.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Take the lock on `dir`.
    ///
    /// Fails with [`SweepError::DirectoryLocked`] if another run holds it. Any
    /// other failure to create the lock file (read-only directory, exotic
    /// filesystem) is logged and the run proceeds unlocked.
    pub fn acquire(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let lock = Self { path };
                if let Err(err) = writeln!(file, "{}", std::process::id()) {
                    log::debug!("Could not record pid in {}: {}", lock.path.display(), err);
                }
                log::debug!("Acquired {}", lock.path.display());
                Ok(Some(lock))
            }
            Err(source) => unlocked(dir, source),
        }
    }
}

fn unlocked(dir: &Path, source: io::Error) -> Result<Option<DirLock>> {
    if source.kind() == ErrorKind::AlreadyExists {
        return Err(SweepError::DirectoryLocked {
            path: dir.to_path_buf(),
        });
    }
    log::warn!(
        "Could not create {} in {}: {}; continuing without a lock",
        LOCK_FILE_NAME,
        dir.display(),
        source
    );
    Ok(None)
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            log::warn!("Failed to remove lock {}: {}", self.path.display(), err);
        }
    }
}
