use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Error accessing directory {}: {source}", path.display())]
    DirectoryAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory {} is locked by another run (remove {} if stale)", path.display(), path.join(crate::lock::LOCK_FILE_NAME).display())]
    DirectoryLocked { path: PathBuf },

    #[error("Error reading file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No position found in {}", path.display())]
    MissingPosition { path: PathBuf },

    #[error("Invalid position in {}: {reason}", path.display())]
    InvalidPosition { path: PathBuf, reason: String },

    #[error("Error writing {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error deleting {}: {source}", path.display())]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
