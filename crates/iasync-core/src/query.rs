//! Incremental search query construction.

use crate::Timestamp;
use std::fmt;

/// Collection filter plus an optional inclusive lower bound on the update date.
///
/// Renders as `collection:<name>` and, when a previous success is known,
/// ` oai_updatedate:[<ts> TO null]`. The bound is inclusive so an item updated
/// exactly at the last success instant is picked up again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub collection: String,
    pub updated_since: Option<Timestamp>,
}

impl SearchQuery {
    pub fn new(collection: impl Into<String>, updated_since: Option<Timestamp>) -> Self {
        Self {
            collection: collection.into(),
            updated_since,
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "collection:{}", self.collection)?;
        if let Some(since) = &self.updated_since {
            write!(f, " oai_updatedate:[{} TO null]", since)?;
        }
        Ok(())
    }
}
