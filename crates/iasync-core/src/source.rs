//! Remote item source abstraction.
//!
//! A source turns a [`SearchQuery`] into a cursor that yields items one at a
//! time. Cursors are pulled lazily; dropping one stops the iteration.

use crate::{SearchQuery, SourceError};
use async_trait::async_trait;

/// A file as described by the remote source.
///
/// `size` and `mtime` are kept as raw text; they are validated later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileRecord {
    pub name: String,
    pub size: Option<String>,
    pub mtime: Option<String>,
}

impl RemoteFileRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            mtime: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    pub fn with_mtime(mut self, mtime: impl Into<String>) -> Self {
        self.mtime = Some(mtime.into());
        self
    }
}

/// An item of the remote collection with its files in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub identifier: String,
    pub files: Vec<RemoteFileRecord>,
}

/// Searches the remote collection.
#[async_trait]
pub trait ItemSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Box<dyn ItemCursor>, SourceError>;
}

/// Pull-based iteration over search results.
#[async_trait]
pub trait ItemCursor: Send {
    /// Next item, or `None` once the results are exhausted.
    async fn next_item(&mut self) -> Result<Option<Item>, SourceError>;
}
