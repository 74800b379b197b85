//! Per-item snapshot rendering and persistence.
//!
//! A snapshot lists an item's in-scope files, one per line:
//!
//! ```text
//! "example.com-inf-20171003-123456-abcde.warc.gz": {size: 1024, mtime: 1507034096}
//! ```

use crate::durable::write_atomic;
use crate::SyncError;
use std::path::{Path, PathBuf};
use tracing::debug;

const SNAPSHOT_EXTENSION: &str = "yaml";

/// One recorded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub name: String,
    pub size: Option<u64>,
    pub mtime: Option<u64>,
}

impl SnapshotEntry {
    /// Render the entry without a line terminator.
    pub fn render(&self) -> String {
        format!(
            "{}: {{size: {}, mtime: {}}}",
            quote(&self.name),
            render_number(self.size),
            render_number(self.mtime)
        )
    }
}

/// All recorded files of one item, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSnapshot {
    pub identifier: String,
    pub entries: Vec<SnapshotEntry>,
}

impl ItemSnapshot {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: SnapshotEntry) {
        self.entries.push(entry);
    }

    /// Render every entry on its own line.
    pub fn render(&self) -> String {
        let mut output = String::new();
        for entry in &self.entries {
            output.push_str(&entry.render());
            output.push('\n');
        }
        output
    }
}

/// Quote a string, escaping backslashes first and then double quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn render_number(value: Option<u64>) -> String {
    match value {
        Some(n) => n.to_string(),
        None => "None".to_string(),
    }
}

/// Writes one snapshot file per item identifier.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Location of an item's snapshot.
    pub fn path_for(&self, identifier: &str) -> Result<PathBuf, SyncError> {
        if !is_safe_identifier(identifier) {
            return Err(SyncError::InvalidIdentifier(identifier.to_string()));
        }
        Ok(self
            .dir
            .join(format!("{}.{}", identifier, SNAPSHOT_EXTENSION)))
    }

    /// Replace the item's snapshot with `snapshot`.
    pub async fn write(&self, snapshot: &ItemSnapshot) -> Result<PathBuf, SyncError> {
        let path = self.path_for(&snapshot.identifier)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let content = snapshot.render();

        // Durable before the success checkpoint can be written
        let temp_path = self
            .dir
            .join(format!(".{}.{}.tmp", snapshot.identifier, SNAPSHOT_EXTENSION));
        write_atomic(&path, &temp_path, content.as_bytes()).await?;

        debug!(path = ?path, entries = snapshot.entries.len(), "Saved snapshot");

        Ok(path)
    }

    /// Read a stored snapshot back as text.
    pub async fn read(&self, identifier: &str) -> Result<Option<String>, SyncError> {
        let path = self.path_for(identifier)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of stored snapshots.
    pub async fn count(&self) -> Result<usize, SyncError> {
        if !self.dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_snapshot = path.extension().map_or(false, |e| e == SNAPSHOT_EXTENSION)
                && !entry.file_name().to_string_lossy().starts_with('.');
            if is_snapshot && entry.file_type().await?.is_file() {
                count += 1;
            }
        }

        Ok(count)
    }
}

fn is_safe_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && !identifier.starts_with('.')
        && !identifier.contains(&['/', '\\', '\0'][..])
}
