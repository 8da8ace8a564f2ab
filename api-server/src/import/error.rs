use crate::import::stats::ImportStats;
use crate::import::store::StoreError;
use std::path::PathBuf;
use thiserror::Error;

pub type ImportResult<T> = Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    /// The dataset could not be read or parsed. Fatal for the whole run.
    #[error("import source {} unavailable: {}", .path.display(), .reason)]
    SourceUnavailable { path: PathBuf, reason: String },
    /// A single record has no `clientId`. Counted, never propagated.
    #[error("record is missing its clientId")]
    MissingKey,
    /// A single store call failed. Counted, never propagated.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("an import is already running")]
    AlreadyRunning,
    #[error("import cancelled after {} of {} records", .stats.accounted(), .stats.total)]
    Cancelled { stats: ImportStats },
}

impl ImportError {
    pub fn source_unavailable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ImportError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
