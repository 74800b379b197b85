//! Sync orchestration.
//!
//! One run reads the progress file, records the new attempt, queries the
//! source for items updated since the last success, rewrites a snapshot for
//! every returned item and finally records the attempt as successful. Any
//! fatal error returns before the second checkpoint, so the next run covers
//! the same window again.

use crate::{
    extract, FileClass, FileClassifier, Item, ItemSnapshot, ItemSource, ProgressStore,
    SearchQuery, SnapshotEntry, SnapshotStore, SyncConfig, SyncError, Timestamp,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Counters for a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Attempt timestamp of this run
    pub started: Timestamp,
    /// Query sent to the source
    pub query: String,
    /// Items whose snapshot was written
    pub items: usize,
    /// Snapshot entries written across all items
    pub entries: usize,
    /// Auxiliary files skipped silently
    pub ignored: usize,
    /// Files skipped because their name matched nothing
    pub unexpected: usize,
    /// Metadata diagnostics raised
    pub diagnostics: usize,
    /// Wall time of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    fn new(started: Timestamp, query: String) -> Self {
        Self {
            started,
            query,
            items: 0,
            entries: 0,
            ignored: 0,
            unexpected: 0,
            diagnostics: 0,
            duration_ms: 0,
        }
    }
}

/// Incremental sync engine.
pub struct SyncEngine {
    collection: String,
    classifier: FileClassifier,
    progress: ProgressStore,
    snapshots: SnapshotStore,
    source: Arc<dyn ItemSource>,
}

impl SyncEngine {
    /// Create an engine from configuration and an item source.
    pub fn new(config: &SyncConfig, source: Arc<dyn ItemSource>) -> Result<Self, SyncError> {
        Ok(Self {
            collection: config.collection.clone(),
            classifier: FileClassifier::with_pattern(&config.file_pattern)?,
            progress: ProgressStore::new(config.progress_path()),
            snapshots: SnapshotStore::new(config.items_dir()),
            source,
        })
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    /// Run one incremental pass starting now.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        self.run_at(Timestamp::now()).await
    }

    /// Run one incremental pass with `start` as the attempt timestamp.
    pub async fn run_at(&self, start: Timestamp) -> Result<SyncReport, SyncError> {
        let timer = Instant::now();

        let previous = self.progress.read().await?;

        // Checkpoint 1: the attempt is in flight, success is unchanged.
        self.progress
            .write(&start, previous.last_success.as_ref())
            .await?;

        let query = SearchQuery::new(self.collection.clone(), previous.last_success);
        info!(query = %query, "Searching");

        let mut report = SyncReport::new(start.clone(), query.to_string());
        let mut cursor = self.source.search(&query).await?;

        while let Some(item) = cursor.next_item().await? {
            self.process_item(&item, &mut report).await?;
        }

        // Checkpoint 2: everything since the previous success is recorded.
        self.progress.write(&start, Some(&start)).await?;

        report.duration_ms = timer.elapsed().as_millis() as u64;
        info!(
            items = report.items,
            entries = report.entries,
            unexpected = report.unexpected,
            diagnostics = report.diagnostics,
            duration_ms = report.duration_ms,
            "Done"
        );

        Ok(report)
    }

    async fn process_item(&self, item: &Item, report: &mut SyncReport) -> Result<(), SyncError> {
        // An item that cannot be recorded must not be passed by the success checkpoint
        self.snapshots.path_for(&item.identifier)?;

        info!(item = %item.identifier, files = item.files.len(), "Processing item");

        let mut snapshot = ItemSnapshot::new(item.identifier.clone());

        for file in &item.files {
            match self.classifier.classify(&file.name) {
                FileClass::InScope => {
                    let extraction = extract(file);
                    for diagnostic in &extraction.diagnostics {
                        error!(item = %item.identifier, "{}", diagnostic);
                    }
                    report.diagnostics += extraction.diagnostics.len();

                    snapshot.push(SnapshotEntry {
                        name: file.name.clone(),
                        size: extraction.metadata.size,
                        mtime: extraction.metadata.mtime,
                    });
                }
                FileClass::Ignorable => {
                    report.ignored += 1;
                }
                FileClass::Unexpected => {
                    info!(item = %item.identifier, "Skipping {}", file.name);
                    report.unexpected += 1;
                }
            }
        }

        self.snapshots.write(&snapshot).await?;

        report.items += 1;
        report.entries += snapshot.entries.len();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ItemCursor, RemoteFileRecord, SourceError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::tempdir;

    /// Source returning a fixed list of items for every query.
    struct FixedSource {
        items: Vec<Item>,
        queries: Mutex<Vec<String>>,
    }

    struct FixedCursor {
        items: VecDeque<Item>,
    }

    #[async_trait]
    impl ItemSource for FixedSource {
        async fn search(&self, query: &SearchQuery) -> Result<Box<dyn ItemCursor>, SourceError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(Box::new(FixedCursor {
                items: self.items.clone().into(),
            }))
        }
    }

    #[async_trait]
    impl ItemCursor for FixedCursor {
        async fn next_item(&mut self) -> Result<Option<Item>, SourceError> {
            Ok(self.items.pop_front())
        }
    }

    fn engine(data_dir: &std::path::Path, items: Vec<Item>) -> (SyncEngine, Arc<FixedSource>) {
        let source = Arc::new(FixedSource {
            items,
            queries: Mutex::new(Vec::new()),
        });
        let config = SyncConfig {
            data_dir: data_dir.to_path_buf(),
            ..Default::default()
        };
        let engine = SyncEngine::new(&config, source.clone()).unwrap();
        (engine, source)
    }

    #[tokio::test]
    async fn test_process_item_counts() {
        let temp_dir = tempdir().unwrap();
        let item = Item {
            identifier: "archiveteam_archivebot_go_001".to_string(),
            files: vec![
                RemoteFileRecord::new("a.com-inf-20171003-123456-abcde.warc.gz")
                    .with_size("10")
                    .with_mtime("20"),
                RemoteFileRecord::new("a.com-inf-20171003-123456-abcde.cdx.gz"),
                RemoteFileRecord::new("a.com-inf-20171003-123456-abcde.json").with_size("x"),
                RemoteFileRecord::new("archiveteam_archivebot_go_001_meta.xml"),
            ],
        };
        let (engine, _) = engine(temp_dir.path(), vec![item]);

        let start = Timestamp::parse("2021-01-01T00:00:00Z").unwrap();
        let report = engine.run_at(start).await.unwrap();

        assert_eq!(report.items, 1);
        assert_eq!(report.entries, 2);
        assert_eq!(report.ignored, 1);
        assert_eq!(report.unexpected, 1);
        assert_eq!(report.diagnostics, 2);

        let content = engine
            .snapshots()
            .read("archiveteam_archivebot_go_001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            content,
            "\"a.com-inf-20171003-123456-abcde.warc.gz\": {size: 10, mtime: 20}\n\
             \"a.com-inf-20171003-123456-abcde.json\": {size: None, mtime: None}\n"
        );
    }

    #[tokio::test]
    async fn test_unsafe_identifier_aborts_run() {
        let temp_dir = tempdir().unwrap();
        let items = vec![
            Item {
                identifier: "fine".to_string(),
                files: vec![],
            },
            Item {
                identifier: "a/b".to_string(),
                files: vec![RemoteFileRecord::new("a.com-20171003-123456.warc.gz")
                    .with_size("1")
                    .with_mtime("2")],
            },
            Item {
                identifier: "after".to_string(),
                files: vec![],
            },
        ];
        let (engine, _) = engine(temp_dir.path(), items);

        let previous = Timestamp::parse("2020-12-01T00:00:00Z").unwrap();
        engine.progress().write(&previous, Some(&previous)).await.unwrap();

        let start = Timestamp::parse("2021-01-01T00:00:00Z").unwrap();
        let result = engine.run_at(start.clone()).await;
        assert!(matches!(result, Err(SyncError::InvalidIdentifier(ref id)) if id == "a/b"));

        let record = engine.progress().read().await.unwrap();
        assert_eq!(record.last_attempt, Some(start));
        assert_eq!(record.last_success, Some(previous));

        assert_eq!(engine.snapshots().count().await.unwrap(), 1);
        assert!(engine.snapshots().read("fine").await.unwrap().is_some());
        assert!(engine.snapshots().read("after").await.unwrap().is_none());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let source = Arc::new(FixedSource {
            items: vec![],
            queries: Mutex::new(Vec::new()),
        });
        let config = SyncConfig {
            file_pattern: "[".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            SyncEngine::new(&config, source),
            Err(SyncError::InvalidPattern(_))
        ));
    }

    #[tokio::test]
    async fn test_query_uses_configured_collection() {
        let temp_dir = tempdir().unwrap();
        let source = Arc::new(FixedSource {
            items: vec![],
            queries: Mutex::new(Vec::new()),
        });
        let config = SyncConfig {
            data_dir: temp_dir.path().to_path_buf(),
            collection: "archiveteam".to_string(),
            ..Default::default()
        };
        let engine = SyncEngine::new(&config, source.clone()).unwrap();

        let report = engine
            .run_at(Timestamp::parse("2021-01-01T00:00:00Z").unwrap())
            .await
            .unwrap();

        assert_eq!(report.query, "collection:archiveteam");
        assert_eq!(
            *source.queries.lock().unwrap(),
            vec!["collection:archiveteam".to_string()]
        );
    }
}
