pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod lock;

pub use crate::core::exact::dedup_exact;
pub use crate::core::namer::rename_batch;
pub use crate::core::proximity::dedup_by_range;
pub use crate::core::report::{DedupSummary, RenameSummary, Reporter};
pub use crate::core::{RunOptions, scan::ScanOptions, scan::ScanOrder};
pub use crate::error::SweepError;
