//! File name classification against the collection's naming convention.

use crate::SyncError;
use regex::Regex;

/// Naming convention for recorded files.
///
/// `<base>[-inf|-shallow]-YYYYMMDD-HHMMSS[-<5-char job id>]<anything><extension>`.
/// The job id segment is missing from the earliest items of the collection,
/// and some early WARCs carry neither qualifier, so both are optional.
pub const DEFAULT_FILE_PATTERN: &str =
    r"^.+(-(inf|shallow))?-\d{8}-\d{6}(-\w{5})?.*(\.warc\.gz|\.warc\.os\.cdx\.gz|\.json|-urls\.txt)$";

/// Auxiliary index files that are expected but not recorded.
const IGNORED_SUFFIX: &str = ".cdx.gz";

/// How a remote file is treated by a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileClass {
    /// Matches the naming convention; recorded in the snapshot
    InScope,
    /// Known auxiliary file; skipped silently
    Ignorable,
    /// Anything else; skipped with an informational event
    Unexpected,
}

impl FileClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileClass::InScope => "in-scope",
            FileClass::Ignorable => "ignorable",
            FileClass::Unexpected => "unexpected",
        }
    }
}

/// Classifies file names with a single anchored pattern.
#[derive(Debug, Clone)]
pub struct FileClassifier {
    pattern: Regex,
}

impl FileClassifier {
    /// Classifier for the default naming convention.
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(DEFAULT_FILE_PATTERN)
                .expect("default file pattern is a valid regex"),
        }
    }

    /// Classifier for a custom naming convention.
    pub fn with_pattern(pattern: &str) -> Result<Self, SyncError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn classify(&self, name: &str) -> FileClass {
        if self.pattern.is_match(name) {
            FileClass::InScope
        } else if name.ends_with(IGNORED_SUFFIX) {
            FileClass::Ignorable
        } else {
            FileClass::Unexpected
        }
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::new()
    }
}
