//! Wire types for the Internet Archive scrape and metadata APIs.

use iasync_core::RemoteFileRecord;
use serde::Deserialize;
use serde_json::Value;

/// One page of `/services/search/v1/scrape` results.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeResponse {
    #[serde(default)]
    pub items: Vec<ScrapeItem>,
    /// Present while more pages remain
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub total: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScrapeItem {
    pub identifier: String,
}

/// Body of `/metadata/<identifier>`; only the file list is used.
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataResponse {
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// A file as listed by the metadata API.
///
/// `size` and `mtime` are normally strings, but they are kept as raw JSON so
/// anything unusual reaches validation instead of failing the whole item.
#[derive(Debug, Clone, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default)]
    pub mtime: Option<Value>,
}

impl FileEntry {
    pub fn into_record(self) -> RemoteFileRecord {
        RemoteFileRecord {
            name: self.name,
            size: self.size.map(raw_text),
            mtime: self.mtime.map(raw_text),
        }
    }
}

fn raw_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}
