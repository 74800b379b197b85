//! iasync Core
//!
//! This crate provides the incremental sync engine for iasync, including:
//! - Crash-safe progress tracking (last attempt / last success)
//! - File name classification against the collection's naming convention
//! - Size/mtime extraction with non-fatal diagnostics
//! - Per-item snapshot rendering and persistence
//! - The orchestrator that ties them to a remote item source

mod config;
mod durable;
mod error;
pub mod classifier;
pub mod metadata;
pub mod progress;
pub mod query;
pub mod snapshot;
pub mod source;
pub mod sync;
mod timestamp;

pub use classifier::{FileClass, FileClassifier, DEFAULT_FILE_PATTERN};
pub use config::{ArchiveConfig, SyncConfig};
pub use error::{ProgressFormatError, SourceError, SyncError};
pub use metadata::{extract, Diagnostic, ExtractedMetadata, Extraction, Field};
pub use progress::{ProgressRecord, ProgressStore};
pub use query::SearchQuery;
pub use snapshot::{quote, ItemSnapshot, SnapshotEntry, SnapshotStore};
pub use source::{Item, ItemCursor, ItemSource, RemoteFileRecord};
pub use sync::{SyncEngine, SyncReport};
pub use timestamp::Timestamp;
