//! Version collectors.
//!
//! Each backend turns a set of remote versions into local still images plus a [`Ledger`]. Work is
//! done one version at a time; every attempt yields a [`CollectOutcome`] so a single bad version
//! never aborts the run.

/// Dropbox HTTP API client.
pub mod dropbox;
/// Authenticated preview-image backend.
pub mod previews;
/// Revision-history backend.
pub mod revisions;
/// `curl` command parsing.
pub mod session;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::ledger::{Ledger, LedgerEntry};

/// Why one version could not be materialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CollectFailure {
    /// 1-based chronological index of the version.
    pub index: usize,
    /// URL or revision id that failed.
    pub source_ref: String,
    /// Human readable cause.
    pub reason: String,
}

/// Result of one collection attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectOutcome {
    /// The version is on disk.
    Success {
        /// Ledger entry for the version.
        entry: LedgerEntry,
        /// `true` when every file already existed and nothing was fetched or converted.
        reused: bool,
    },
    /// The version was skipped.
    Failure(CollectFailure),
}

/// Aggregate of a collection run.
#[derive(Clone, Debug, Default)]
pub struct CollectReport {
    /// Successfully materialized versions, chronological.
    pub ledger: Ledger,
    /// Versions that were skipped, chronological.
    pub failures: Vec<CollectFailure>,
    /// Number of versions attempted.
    pub attempted: usize,
    /// Number of successes served entirely from files already on disk.
    pub reused: usize,
    /// `true` when the source may hold more versions than were listed.
    pub possibly_truncated: bool,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl CollectReport {
    /// Fold per-version outcomes into a report.
    pub fn from_outcomes(
        outcomes: impl IntoIterator<Item = CollectOutcome>,
        started: Instant,
    ) -> Self {
        let mut report = Self::default();
        for outcome in outcomes {
            report.attempted += 1;
            match outcome {
                CollectOutcome::Success { entry, reused } => {
                    report.reused += usize::from(reused);
                    report.ledger.push(entry);
                }
                CollectOutcome::Failure(f) => report.failures.push(f),
            }
        }
        report.elapsed = started.elapsed();
        report
    }

    /// Number of versions that made it into the ledger.
    pub fn succeeded(&self) -> usize {
        self.ledger.len()
    }

    /// Emit the end-of-run summary through `tracing`.
    pub fn log_summary(&self, outdir: &Path) {
        for f in &self.failures {
            tracing::warn!(
                index = f.index,
                source = %f.source_ref,
                reason = %f.reason,
                "version skipped"
            );
        }
        tracing::info!(
            attempted = self.attempted,
            succeeded = self.succeeded(),
            reused = self.reused,
            elapsed_secs = self.elapsed.as_secs_f64(),
            "{} / {} versions collected into {}",
            self.succeeded(),
            self.attempted,
            outdir.display()
        );
    }
}

/// `{outdir}/{prefix}_{index:03}{ext}`, the numbering scheme shared by both backends.
pub(crate) fn numbered_path(outdir: &Path, prefix: &str, index: usize, ext: &str) -> PathBuf {
    outdir.join(format!("{prefix}_{index:03}{ext}"))
}
