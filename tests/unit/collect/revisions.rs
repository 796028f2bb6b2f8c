use super::*;
use std::path::PathBuf;

use crate::storage::MemStorage;

/// Revision history with `count` entries, newest first, one minute apart.
struct FakeHistory {
    revisions: Vec<Revision>,
    fail_revs: Vec<String>,
    listings: usize,
    downloads: Vec<String>,
}

impl FakeHistory {
    fn with_count(count: usize) -> Self {
        let mut revisions = (0..count)
            .map(|i| Revision {
                rev: format!("r{i:04}"),
                server_modified: Timestamp::parse(&format!(
                    "2025-01-{:02}T{:02}:{:02}:00Z",
                    1 + i / 1440,
                    (i / 60) % 24,
                    i % 60
                ))
                .unwrap(),
            })
            .collect::<Vec<_>>();
        revisions.reverse();
        Self {
            revisions,
            fail_revs: Vec::new(),
            listings: 0,
            downloads: Vec::new(),
        }
    }

    fn calls(&self) -> usize {
        self.listings + self.downloads.len()
    }
}

impl RevisionSource for FakeHistory {
    fn list_revisions(&mut self, _path: &str, limit: u32) -> RevlapseResult<Vec<Revision>> {
        self.listings += 1;
        Ok(self.revisions.iter().take(limit as usize).cloned().collect())
    }

    fn download(&mut self, _path: &str, rev: &str) -> RevlapseResult<Vec<u8>> {
        self.downloads.push(rev.to_string());
        if self.fail_revs.iter().any(|r| r == rev) {
            return Err(RevlapseError::fetch(format!("download of {rev} failed: 409")));
        }
        Ok(format!("png-bytes-{rev}").into_bytes())
    }
}

/// Converter that tags its input so tests can tell converted stills apart.
struct TagConverter;

impl FormatConverter for TagConverter {
    fn name(&self) -> &'static str {
        "tag"
    }

    fn convert(&self, raw: &[u8]) -> RevlapseResult<Vec<u8>> {
        let mut out = b"converted:".to_vec();
        out.extend_from_slice(raw);
        Ok(out)
    }
}

fn registry() -> ConverterRegistry {
    ConverterRegistry::standard(200).with(".pdf", TagConverter)
}

#[test]
fn lists_oldest_first_with_numbered_stills() {
    let mut source = FakeHistory::with_count(3);
    let mut storage = MemStorage::new();

    let report = collect_revisions(
        "/designs/logo.png",
        100,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    assert_eq!(source.downloads, ["r0000", "r0001", "r0002"]);
    assert_eq!(report.succeeded(), 3);
    assert!(!report.possibly_truncated);
    let first = &report.ledger.entries()[0];
    assert_eq!(first.path, PathBuf::from("out/version_001.png"));
    assert_eq!(first.timestamp.as_str(), "2025-01-01T00:00:00Z");
    assert_eq!(
        storage.read(Path::new("out/version_003.png")).unwrap(),
        b"png-bytes-r0002"
    );
}

#[test]
fn pdf_revisions_keep_raw_file_and_converted_sibling() {
    let mut source = FakeHistory::with_count(2);
    let mut storage = MemStorage::new();

    collect_revisions(
        "/designs/Poster.PDF",
        10,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    assert_eq!(
        storage.read(Path::new("out/version_001.pdf")).unwrap(),
        b"png-bytes-r0000"
    );
    assert_eq!(
        storage.read(Path::new("out/version_001.png")).unwrap(),
        b"converted:png-bytes-r0000"
    );
}

#[test]
fn listing_ceiling_caps_at_one_hundred_and_flags_truncation() {
    let mut source = FakeHistory::with_count(150);
    let mut storage = MemStorage::new();

    let report = collect_revisions(
        "/designs/logo.png",
        500,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    assert_eq!(report.attempted, 100);
    assert_eq!(report.succeeded(), 100);
    assert!(report.possibly_truncated);
    // The newest hundred are kept; the oldest of them becomes version 001.
    assert_eq!(source.downloads.first().map(String::as_str), Some("r0050"));
    assert_eq!(source.downloads.last().map(String::as_str), Some("r0149"));
}

#[test]
fn full_page_at_requested_limit_is_flagged() {
    let mut source = FakeHistory::with_count(5);
    let mut storage = MemStorage::new();
    let report = collect_revisions(
        "/a.png",
        5,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();
    assert!(report.possibly_truncated);
}

#[test]
fn unsupported_extension_fails_before_any_call() {
    let mut source = FakeHistory::with_count(3);
    let mut storage = MemStorage::new();

    let err = collect_revisions(
        "/notes/plan.docx",
        100,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .err()
    .unwrap();

    assert!(err.to_string().contains("unsupported file type '.docx'"));
    assert!(err.to_string().contains(".pdf, .png"));
    assert_eq!(source.calls(), 0);
    assert_eq!(storage.write_count(), 0);
}

#[test]
fn relative_document_path_is_rejected() {
    let mut source = FakeHistory::with_count(1);
    let mut storage = MemStorage::new();
    let res = collect_revisions(
        "designs/logo.png",
        100,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    );
    assert!(matches!(res, Err(RevlapseError::Validation(_))));
    assert_eq!(source.calls(), 0);
}

#[test]
fn rerun_reuses_every_still_without_downloads() {
    let mut storage = MemStorage::new();
    let mut first = FakeHistory::with_count(4);
    let report1 = collect_revisions(
        "/d.pdf",
        100,
        &mut first,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    let mut second = FakeHistory::with_count(4);
    let report2 = collect_revisions(
        "/d.pdf",
        100,
        &mut second,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    assert!(second.downloads.is_empty());
    assert_eq!(report2.reused, 4);
    assert_eq!(report1.ledger.to_json().unwrap(), report2.ledger.to_json().unwrap());
}

#[test]
fn missing_still_is_reconverted_from_raw_file() {
    let mut storage = MemStorage::new();
    let mut first = FakeHistory::with_count(2);
    collect_revisions(
        "/d.pdf",
        100,
        &mut first,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();
    storage.remove(Path::new("out/version_002.png")).unwrap();

    let mut second = FakeHistory::with_count(2);
    let report = collect_revisions(
        "/d.pdf",
        100,
        &mut second,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    assert!(second.downloads.is_empty());
    assert_eq!(report.reused, 1);
    assert!(storage.exists(Path::new("out/version_002.png")));
}

#[test]
fn failed_download_is_recorded_and_run_continues() {
    let mut source = FakeHistory::with_count(3);
    source.fail_revs.push("r0001".to_string());
    let mut storage = MemStorage::new();

    let report = collect_revisions(
        "/d.png",
        100,
        &mut source,
        &registry(),
        &mut storage,
        Path::new("out"),
    )
    .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(report.failures[0].source_ref, "r0001");
    assert!(report.failures[0].reason.contains("409"));
    assert_eq!(
        report.ledger.entries()[1].path,
        PathBuf::from("out/version_003.png")
    );
}
