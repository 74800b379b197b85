//! Second-precision UTC timestamps in `YYYY-MM-DDTHH:MM:SSZ` form.

use crate::SyncError;
use chrono::{DateTime, Utc};
use std::fmt;

const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Positions of the separators in `YYYY-MM-DDTHH:MM:SSZ`; every other byte is a digit.
const SEPARATORS: [(usize, u8); 6] = [
    (4, b'-'),
    (7, b'-'),
    (10, b'T'),
    (13, b':'),
    (16, b':'),
    (19, b'Z'),
];

/// A validated sync timestamp.
///
/// Only the textual shape is checked, so a value read from disk is written
/// back byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(String);

impl Timestamp {
    /// Parse and validate a timestamp.
    pub fn parse(value: &str) -> Result<Self, SyncError> {
        if is_timestamp(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(SyncError::InvalidTimestamp(value.to_string()))
        }
    }

    /// The current instant, truncated to whole seconds.
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.format(FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_timestamp(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 20 {
        return false;
    }

    bytes.iter().enumerate().all(|(i, b)| {
        match SEPARATORS.iter().find(|(pos, _)| *pos == i) {
            Some((_, sep)) => b == sep,
            None => b.is_ascii_digit(),
        }
    })
}
