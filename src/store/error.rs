//! Store Errors
//!
//! Error types for account and ledger persistence.

use std::path::PathBuf;

/// Errors that can occur in the stores
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a snapshot file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot file exists but is not a valid collection
    #[error("Corrupt snapshot {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Two records in a loaded snapshot share an identifier
    #[error("Duplicate record {0} in snapshot")]
    DuplicateRecord(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error came from the filesystem (retry may help)
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Io { .. })
    }
}
