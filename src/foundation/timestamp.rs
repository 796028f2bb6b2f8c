use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::foundation::error::{RevlapseError, RevlapseResult};

/// Caption rendering, fixed to English abbreviations regardless of host locale.
pub const CAPTION_FORMAT: &str = "%a %b %d - %H:%M:%S";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// An ISO-8601 timestamp that keeps its original spelling.
///
/// Ordering is by the instant it denotes. Timestamps without an offset are taken as UTC for
/// ordering purposes and rendered as written. The original string is what gets persisted, so a
/// ledger round-trips without precision loss.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timestamp {
    raw: String,
    local: NaiveDateTime,
    utc: NaiveDateTime,
}

impl Timestamp {
    /// Parse an ISO-8601 datetime (with or without offset) or a bare date.
    pub fn parse(raw: &str) -> RevlapseResult<Self> {
        let s = raw.trim();
        if let Some(dt) = parse_with_offset(s) {
            return Ok(Self {
                raw: raw.to_string(),
                local: dt.naive_local(),
                utc: dt.naive_utc(),
            });
        }
        if let Some(naive) = parse_naive(s) {
            return Ok(Self {
                raw: raw.to_string(),
                local: naive,
                utc: naive,
            });
        }
        Err(RevlapseError::timestamp(format!(
            "'{raw}' is not an ISO-8601 datetime"
        )))
    }

    /// The timestamp exactly as it was supplied.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The denoted instant, normalized to UTC.
    pub fn instant(&self) -> NaiveDateTime {
        self.utc
    }

    /// Human readable caption, e.g. `Thu Jan 09 - 14:52:00`, in the timestamp's own offset.
    pub fn caption(&self) -> String {
        self.local.format(CAPTION_FORMAT).to_string()
    }
}

fn parse_with_offset(s: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl TryFrom<String> for Timestamp {
    type Error = RevlapseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self {
        value.raw
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timestamp {}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utc
            .cmp(&other.utc)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/timestamp.rs"]
mod tests;
