//! Size/mtime extraction from untrusted remote file records.
//!
//! Bad metadata never fails an item: each field degrades to `None` and
//! produces a [`Diagnostic`] for the log.

use crate::RemoteFileRecord;
use std::fmt;

/// Validated metadata for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractedMetadata {
    pub size: Option<u64>,
    pub mtime: Option<u64>,
}

/// Metadata field a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Size,
    Mtime,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::Size => "Size",
            Field::Mtime => "Mtime",
        }
    }
}

/// A non-fatal problem found while extracting metadata, logged at error level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Field absent from the record
    Missing { file: String, field: Field },
    /// Field present but not a non-negative integer
    Invalid {
        file: String,
        field: Field,
        raw: String,
    },
}

impl Diagnostic {
    pub fn field(&self) -> Field {
        match self {
            Diagnostic::Missing { field, .. } | Diagnostic::Invalid { field, .. } => *field,
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Diagnostic::Missing { file, .. } | Diagnostic::Invalid { file, .. } => file,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Missing { file, field } => {
                write!(f, "{} of {} is missing", field.name(), file)
            }
            Diagnostic::Invalid { file, field, raw } => write!(
                f,
                "{} of {} invalid: {:?} is not a non-negative integer",
                field.name(),
                file,
                raw
            ),
        }
    }
}

/// Result of extracting one record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub metadata: ExtractedMetadata,
    pub diagnostics: Vec<Diagnostic>,
}

/// Extract size and mtime, each field independently of the other.
pub fn extract(record: &RemoteFileRecord) -> Extraction {
    let mut diagnostics = Vec::new();

    let size = extract_field(
        &record.name,
        Field::Size,
        record.size.as_deref(),
        &mut diagnostics,
    );
    let mtime = extract_field(
        &record.name,
        Field::Mtime,
        record.mtime.as_deref(),
        &mut diagnostics,
    );

    Extraction {
        metadata: ExtractedMetadata { size, mtime },
        diagnostics,
    }
}

fn extract_field(
    file: &str,
    field: Field,
    raw: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<u64> {
    let Some(raw) = raw else {
        diagnostics.push(Diagnostic::Missing {
            file: file.to_string(),
            field,
        });
        return None;
    };

    let parsed = if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        // Only overflow can fail here.
        raw.parse::<u64>().ok()
    } else {
        None
    };

    if parsed.is_none() {
        diagnostics.push(Diagnostic::Invalid {
            file: file.to_string(),
            field,
            raw: raw.to_string(),
        });
    }

    parsed
}
