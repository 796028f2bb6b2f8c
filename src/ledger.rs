//! The metadata ledger: `(still path, timestamp)` pairs handed from collection to rendering.
//!
//! On disk it is a JSON array of two-element arrays, pretty-printed with a 4-space indent:
//!
//! ```json
//! [
//!     [
//!         "versions/preview_001.png",
//!         "2025-01-08T09:12:00.000Z"
//!     ]
//! ]
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize as _;

use crate::foundation::error::{RevlapseError, RevlapseResult};
use crate::foundation::timestamp::Timestamp;
use crate::storage::Storage;

/// One materialized version.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "(PathBuf, Timestamp)", into = "(PathBuf, Timestamp)")]
pub struct LedgerEntry {
    /// Path of the still image.
    pub path: PathBuf,
    /// When this version was saved.
    pub timestamp: Timestamp,
}

impl LedgerEntry {
    /// Build an entry.
    pub fn new(path: impl Into<PathBuf>, timestamp: Timestamp) -> Self {
        Self {
            path: path.into(),
            timestamp,
        }
    }
}

impl From<(PathBuf, Timestamp)> for LedgerEntry {
    fn from((path, timestamp): (PathBuf, Timestamp)) -> Self {
        Self { path, timestamp }
    }
}

impl From<LedgerEntry> for (PathBuf, Timestamp) {
    fn from(e: LedgerEntry) -> Self {
        (e.path, e.timestamp)
    }
}

/// Ordered list of [`LedgerEntry`] values.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    /// Wrap entries as given; no reordering.
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    /// Entries in stored order.
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Append one entry.
    pub fn push(&mut self, entry: LedgerEntry) {
        self.entries.push(entry);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` when the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted ascending by timestamp; equal timestamps keep stored order.
    pub fn sorted(&self) -> Vec<LedgerEntry> {
        let mut out = self.entries.clone();
        out.sort_by(|a, b| a.timestamp.instant().cmp(&b.timestamp.instant()));
        out
    }

    /// Serialize to the on-disk JSON form.
    pub fn to_json(&self) -> RevlapseResult<Vec<u8>> {
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser)
            .map_err(|e| RevlapseError::serde(format!("encode ledger: {e}")))?;
        Ok(buf)
    }

    /// Parse the on-disk JSON form.
    pub fn from_json(bytes: &[u8]) -> RevlapseResult<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| RevlapseError::serde(format!("decode ledger: {e}")))
    }

    /// Write the ledger through `storage`.
    pub fn save(&self, storage: &mut dyn Storage, path: &Path) -> RevlapseResult<()> {
        storage.write(path, &self.to_json()?)
    }

    /// Read a ledger through `storage`.
    pub fn load(storage: &dyn Storage, path: &Path) -> RevlapseResult<Self> {
        Self::from_json(&storage.read(path)?)
    }
}

impl FromIterator<LedgerEntry> for Ledger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "../tests/unit/ledger.rs"]
mod tests;
