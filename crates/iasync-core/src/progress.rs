//! Durable record of the last sync attempt and the last successful sync.
//!
//! The file is a fixed four-line, human-readable layout:
//!
//! ```text
//! Date of last update attempt:
//! 2020-01-02T03:04:05Z
//! Date of last successful update:
//! None
//! ```
//!
//! The orchestrator writes it twice per run: once before touching the
//! network (new attempt, previous success carried forward) and once after
//! the run completed (success = attempt). A crash in between leaves the
//! previous success in place, so the next run re-covers the same window.

use crate::durable::write_atomic;
use crate::{ProgressFormatError, SyncError, Timestamp};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const ATTEMPT_LABEL: &str = "Date of last update attempt:";
const SUCCESS_LABEL: &str = "Date of last successful update:";
const NONE: &str = "None";

/// Last attempt / last success, either of which may not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub last_attempt: Option<Timestamp>,
    pub last_success: Option<Timestamp>,
}

impl ProgressRecord {
    /// True when the most recent attempt has not been confirmed as successful.
    pub fn is_pending(&self) -> bool {
        self.last_attempt.is_some() && self.last_attempt != self.last_success
    }
}

/// Reads and writes the progress file.
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record. A missing file means nothing has run yet.
    pub async fn read(&self) -> Result<ProgressRecord, SyncError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = ?self.path, "No progress file, starting from scratch");
                return Ok(ProgressRecord::default());
            }
            Err(e) => return Err(e.into()),
        };

        let record = parse(&content).map_err(|reason| SyncError::MalformedProgress {
            path: self.path.clone(),
            reason,
        })?;

        debug!(
            last_attempt = %or_none(record.last_attempt.as_ref()),
            last_success = %or_none(record.last_success.as_ref()),
            "Loaded progress"
        );

        Ok(record)
    }

    /// Replace the file with the given attempt and success.
    ///
    /// Written to a temporary sibling, fsynced and renamed over the target;
    /// the directory entry is fsynced too.
    pub async fn write(
        &self,
        attempt: &Timestamp,
        success: Option<&Timestamp>,
    ) -> Result<(), SyncError> {
        info!(attempt = %attempt, success = %or_none(success), "Writing progress file");

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let record = ProgressRecord {
            last_attempt: Some(attempt.clone()),
            last_success: success.cloned(),
        };
        let content = render(&record);

        write_atomic(&self.path, &self.temp_path(), content.as_bytes()).await?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "progress".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }
}

/// Render a record in the four-line layout.
pub fn render(record: &ProgressRecord) -> String {
    format!(
        "{}\n{}\n{}\n{}\n",
        ATTEMPT_LABEL,
        or_none(record.last_attempt.as_ref()),
        SUCCESS_LABEL,
        or_none(record.last_success.as_ref()),
    )
}

/// Parse the four-line layout. `\n`, `\r\n` and a lone `\r` all end a line.
pub fn parse(content: &str) -> Result<ProgressRecord, ProgressFormatError> {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() != 4 {
        return Err(ProgressFormatError::LineCount(lines.len()));
    }

    if !lines[0].to_lowercase().contains("attempt") {
        return Err(ProgressFormatError::MissingAttemptLabel);
    }
    let last_attempt = parse_date(lines[1])
        .map_err(|_| ProgressFormatError::InvalidAttemptDate(lines[1].trim().to_string()))?;

    if !lines[2].to_lowercase().contains("success") {
        return Err(ProgressFormatError::MissingSuccessLabel);
    }
    let last_success = parse_date(lines[3])
        .map_err(|_| ProgressFormatError::InvalidSuccessDate(lines[3].trim().to_string()))?;

    Ok(ProgressRecord {
        last_attempt,
        last_success,
    })
}

fn parse_date(line: &str) -> Result<Option<Timestamp>, SyncError> {
    match line.trim() {
        NONE => Ok(None),
        value => Timestamp::parse(value).map(Some),
    }
}

fn or_none(value: Option<&Timestamp>) -> &str {
    value.map(Timestamp::as_str).unwrap_or(NONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ts(value: &str) -> Timestamp {
        Timestamp::parse(value).unwrap()
    }

    #[test]
    fn test_parse_valid() {
        let record = parse(
            "Date of last update attempt:\n2020-01-02T03:04:05Z\nDate of last successful update:\nNone\n",
        )
        .unwrap();

        assert_eq!(record.last_attempt, Some(ts("2020-01-02T03:04:05Z")));
        assert_eq!(record.last_success, None);
    }

    #[test]
    fn test_parse_freeform_labels_and_whitespace() {
        let record = parse("LAST ATTEMPT\n  2020-01-02T03:04:05Z \r\nSuccess!\nNone").unwrap();

        assert_eq!(record.last_attempt, Some(ts("2020-01-02T03:04:05Z")));
        assert_eq!(record.last_success, None);
    }

    #[test]
    fn test_parse_carriage_return_lines() {
        let expected = ProgressRecord {
            last_attempt: Some(ts("2020-01-02T03:04:05Z")),
            last_success: Some(ts("2020-01-01T00:00:00Z")),
        };

        for content in [
            "attempt\r2020-01-02T03:04:05Z\rsuccess\r2020-01-01T00:00:00Z\r",
            "attempt\r\n2020-01-02T03:04:05Z\r\nsuccess\r\n2020-01-01T00:00:00Z\r\n",
            "attempt\n2020-01-02T03:04:05Z\r\nsuccess\r2020-01-01T00:00:00Z",
        ] {
            assert_eq!(parse(content).unwrap(), expected, "{content:?}");
        }
    }

    #[test]
    fn test_parse_line_count() {
        assert_eq!(
            parse("attempt\nNone\nsuccess\n"),
            Err(ProgressFormatError::LineCount(3))
        );
        assert_eq!(
            parse("attempt\nNone\nsuccess\nNone\n\n"),
            Err(ProgressFormatError::LineCount(5))
        );
        assert_eq!(parse(""), Err(ProgressFormatError::LineCount(0)));
    }

    #[test]
    fn test_parse_missing_labels() {
        assert_eq!(
            parse("first\nNone\nsuccess\nNone\n"),
            Err(ProgressFormatError::MissingAttemptLabel)
        );
        assert_eq!(
            parse("attempt\nNone\nsecond\nNone\n"),
            Err(ProgressFormatError::MissingSuccessLabel)
        );
    }

    #[test]
    fn test_parse_invalid_dates() {
        assert_eq!(
            parse("attempt\nyesterday\nsuccess\nNone\n"),
            Err(ProgressFormatError::InvalidAttemptDate("yesterday".to_string()))
        );
        assert_eq!(
            parse("attempt\nNone\nsuccess\n2020-01-01\n"),
            Err(ProgressFormatError::InvalidSuccessDate("2020-01-01".to_string()))
        );
        // `none` is not the literal marker
        assert!(parse("attempt\nnone\nsuccess\nNone\n").is_err());
    }

    #[test]
    fn test_render_parse_roundtrip() {
        let records = [
            ProgressRecord::default(),
            ProgressRecord {
                last_attempt: Some(ts("2021-06-07T08:09:10Z")),
                last_success: None,
            },
            ProgressRecord {
                last_attempt: Some(ts("2021-06-07T08:09:10Z")),
                last_success: Some(ts("2021-06-01T00:00:00Z")),
            },
        ];

        for record in records {
            assert_eq!(parse(&render(&record)).unwrap(), record);
        }
    }

    #[test]
    fn test_is_pending() {
        let mut record = ProgressRecord::default();
        assert!(!record.is_pending());

        record.last_attempt = Some(ts("2021-06-07T08:09:10Z"));
        assert!(record.is_pending());

        record.last_success = record.last_attempt.clone();
        assert!(!record.is_pending());
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let temp_dir = tempdir().unwrap();
        let store = ProgressStore::new(temp_dir.path().join("last-update"));

        let record = store.read().await.unwrap();
        assert_eq!(record, ProgressRecord::default());
    }

    #[tokio::test]
    async fn test_read_malformed_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("last-update");
        std::fs::write(&path, "garbage\n").unwrap();

        let store = ProgressStore::new(path);
        let result = store.read().await;
        assert!(matches!(
            result,
            Err(SyncError::MalformedProgress {
                reason: ProgressFormatError::LineCount(1),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let temp_dir = tempdir().unwrap();
        let store = ProgressStore::new(temp_dir.path().join("data").join("last-update"));
        let attempt = ts("2022-02-02T02:02:02Z");
        let success = ts("2022-01-01T01:01:01Z");

        store.write(&attempt, Some(&success)).await.unwrap();

        let content = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            "Date of last update attempt:\n2022-02-02T02:02:02Z\nDate of last successful update:\n2022-01-01T01:01:01Z\n"
        );

        let record = store.read().await.unwrap();
        assert_eq!(record.last_attempt, Some(attempt));
        assert_eq!(record.last_success, Some(success));
    }

    #[tokio::test]
    async fn test_write_twice_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let store = ProgressStore::new(temp_dir.path().join("last-update"));
        let attempt = ts("2022-02-02T02:02:02Z");

        store.write(&attempt, None).await.unwrap();
        store.write(&attempt, None).await.unwrap();

        let record = store.read().await.unwrap();
        assert_eq!(record.last_attempt, Some(attempt));
        assert_eq!(record.last_success, None);
        assert!(!temp_dir.path().join(".last-update.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_write_read_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("last-update");
        std::fs::write(&path, "attempt:\n2019-05-05T05:05:05Z\nsuccess:\n2019-05-04T04:04:04Z\n")
            .unwrap();

        let store = ProgressStore::new(path);
        let first = store.read().await.unwrap();
        store
            .write(
                first.last_attempt.as_ref().unwrap(),
                first.last_success.as_ref(),
            )
            .await
            .unwrap();
        let second = store.read().await.unwrap();

        assert_eq!(first, second);
    }
}
