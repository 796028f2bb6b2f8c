use std::path::Path;
use std::time::Instant;

use crate::assets::convert::{ConverterRegistry, FormatConverter};
use crate::collect::{CollectFailure, CollectOutcome, CollectReport, numbered_path};
use crate::config::MAX_REVISIONS;
use crate::foundation::error::{RevlapseError, RevlapseResult};
use crate::foundation::timestamp::Timestamp;
use crate::ledger::LedgerEntry;
use crate::storage::Storage;

/// One entry of a document's revision history.
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize)]
pub struct Revision {
    /// Store-assigned revision id.
    pub rev: String,
    /// When the store recorded this revision.
    pub server_modified: Timestamp,
}

/// Read access to a cloud store's revision history.
pub trait RevisionSource {
    /// List at most `limit` revisions of `path`, newest first.
    fn list_revisions(&mut self, path: &str, limit: u32) -> RevlapseResult<Vec<Revision>>;
    /// Download the bytes of revision `rev` of `path`.
    fn download(&mut self, path: &str, rev: &str) -> RevlapseResult<Vec<u8>>;
}

/// Download and convert every listed revision of `doc_path` into `outdir`.
///
/// The converter is resolved from the document extension before the source is contacted, so an
/// unsupported type fails without any network traffic. Raw revisions land in
/// `version_{index:03}{ext}` and their stills in `version_{index:03}.png`; both are reused when
/// present.
pub fn collect_revisions(
    doc_path: &str,
    limit: u32,
    source: &mut dyn RevisionSource,
    converters: &ConverterRegistry,
    storage: &mut dyn Storage,
    outdir: &Path,
) -> RevlapseResult<CollectReport> {
    let started = Instant::now();
    if !doc_path.starts_with('/') {
        return Err(RevlapseError::validation(format!(
            "document path '{doc_path}' must start with '/'"
        )));
    }
    let (ext, converter) = converters.resolve(doc_path)?;
    if limit == 0 {
        return Err(RevlapseError::validation("revision limit must be > 0"));
    }

    let clamped = limit > MAX_REVISIONS;
    let limit = limit.min(MAX_REVISIONS);
    if clamped {
        tracing::warn!(limit, "requested revision limit exceeds the listing ceiling, clamped");
    }

    storage.create_dir_all(outdir)?;

    let mut revisions = source.list_revisions(doc_path, limit)?;
    let listed = revisions.len();
    revisions.truncate(limit as usize);
    revisions.reverse();

    let possibly_truncated = clamped || listed >= limit as usize;
    if possibly_truncated {
        tracing::warn!(
            "Found {} versions, which is the listing ceiling; older revisions may exist and \
             were not retrieved",
            revisions.len()
        );
    }

    let n = revisions.len();
    let mut outcomes = Vec::with_capacity(n);
    for (i, revision) in revisions.iter().enumerate() {
        let index = i + 1;
        let outcome = materialize(
            doc_path, index, n, revision, &ext, converter, source, storage, outdir,
        );
        outcomes.push(match outcome {
            Ok((png, reused)) => CollectOutcome::Success {
                entry: LedgerEntry::new(png, revision.server_modified.clone()),
                reused,
            },
            Err(e) => {
                tracing::warn!(rev = %revision.rev, error = %e, "revision skipped");
                CollectOutcome::Failure(CollectFailure {
                    index,
                    source_ref: revision.rev.clone(),
                    reason: e.to_string(),
                })
            }
        });
    }

    let mut report = CollectReport::from_outcomes(outcomes, started);
    report.possibly_truncated = possibly_truncated;
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn materialize(
    doc_path: &str,
    index: usize,
    n: usize,
    revision: &Revision,
    ext: &str,
    converter: &dyn FormatConverter,
    source: &mut dyn RevisionSource,
    storage: &mut dyn Storage,
    outdir: &Path,
) -> RevlapseResult<(std::path::PathBuf, bool)> {
    let raw_path = numbered_path(outdir, "version", index, ext);
    let png_path = numbered_path(outdir, "version", index, ".png");

    if storage.exists(&png_path) {
        tracing::debug!(index, path = %png_path.display(), "revision already converted");
        return Ok((png_path, true));
    }

    let raw = if storage.exists(&raw_path) {
        tracing::debug!(index, path = %raw_path.display(), "revision already downloaded");
        storage.read(&raw_path)?
    } else {
        tracing::info!(
            "{index:03} / {n}. Downloading rev {} as {} ...",
            revision.rev,
            raw_path.display()
        );
        let raw = source.download(doc_path, &revision.rev)?;
        storage.write(&raw_path, &raw)?;
        raw
    };

    // For .png sources raw and still share a path; the write above already produced it.
    if raw_path != png_path {
        tracing::info!(
            index,
            converter = converter.name(),
            "converting {} to {}",
            raw_path.display(),
            png_path.display()
        );
        let png = converter.convert(&raw)?;
        storage.write(&png_path, &png)?;
    }
    Ok((png_path, false))
}

#[cfg(test)]
#[path = "../../tests/unit/collect/revisions.rs"]
mod tests;
