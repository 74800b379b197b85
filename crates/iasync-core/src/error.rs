//! Sync error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can abort a sync run or reject its inputs.
#[derive(Debug, Error)]
pub enum SyncError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The progress file exists but cannot be trusted
    #[error("Malformed progress file {}: {reason}", path.display())]
    MalformedProgress {
        path: PathBuf,
        reason: ProgressFormatError,
    },

    /// The remote item source failed
    #[error("Item source error: {0}")]
    Source(#[from] SourceError),

    /// Naming convention pattern did not compile
    #[error("Invalid file pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Text that is not a `YYYY-MM-DDTHH:MM:SSZ` timestamp
    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    /// Item identifier that cannot be used as a snapshot file name
    #[error("Invalid item identifier: {0:?}")]
    InvalidIdentifier(String),

    /// Configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Structural problems found in the progress file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressFormatError {
    #[error("expected exactly 4 lines, found {0}")]
    LineCount(usize),

    #[error("date of last attempt not found")]
    MissingAttemptLabel,

    #[error("date of last attempt does not look like a date: {0:?}")]
    InvalidAttemptDate(String),

    #[error("date of last success not found")]
    MissingSuccessLabel,

    #[error("date of last success does not look like a date: {0:?}")]
    InvalidSuccessDate(String),
}

/// Failures reported by an item source implementation.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Remote returned a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Decode(e.to_string())
    }
}
