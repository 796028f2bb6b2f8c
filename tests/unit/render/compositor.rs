use super::*;
use std::io::Cursor;

use crate::ledger::LedgerEntry;
use crate::render::caption::BlockCaption;
use crate::storage::MemStorage;

const RED: [u8; 4] = [200, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 200, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn png(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_pixel(w, h, image::Rgba(px));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn entry(path: &str, ts: &str) -> LedgerEntry {
    LedgerEntry::new(path, Timestamp::parse(ts).unwrap())
}

/// Older 100x100 red still, newer 200x150 blue still, listed newest first.
fn two_version_fixture() -> (Ledger, MemStorage) {
    let mut storage = MemStorage::new();
    storage
        .write(Path::new("v/preview_001.png"), &png(100, 100, RED))
        .unwrap();
    storage
        .write(Path::new("v/preview_002.png"), &png(200, 150, BLUE))
        .unwrap();
    let ledger = Ledger::new(vec![
        entry("v/preview_002.png", "2025-01-09T14:52:00Z"),
        entry("v/preview_001.png", "2025-01-08T09:00:00Z"),
    ]);
    (ledger, storage)
}

fn decode_frame(storage: &MemStorage, path: &Path) -> RgbaImage {
    decode_rgba(&storage.read(path).unwrap()).unwrap()
}

#[test]
fn canvas_takes_largest_still_plus_header() {
    let c = compute_canvas(&[(100, 100), (200, 150)], 28, 10).unwrap();
    assert_eq!(
        c,
        Canvas {
            width: 200,
            height: 188,
            header_height: 38,
        }
    );

    // An older, wider still widens the canvas rather than being cropped.
    let c = compute_canvas(&[(300, 80), (200, 150)], 28, 10).unwrap();
    assert_eq!((c.width, c.body_height()), (300, 150));

    assert!(compute_canvas(&[], 28, 10).is_err());
}

#[test]
fn frame_path_embeds_tag_next_to_still() {
    assert_eq!(
        frame_path(Path::new("v/preview_001.png"), 0xab),
        PathBuf::from("v/preview_001_overlaid_00000000000000ab.png")
    );
}

#[test]
fn frames_follow_timestamp_order() {
    let (ledger, mut storage) = two_version_fixture();
    let report = composite_frames(
        &ledger,
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    )
    .unwrap();

    assert_eq!(report.frames.len(), 2);
    let names: Vec<String> = report
        .frames
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert!(names[0].starts_with("preview_001_overlaid_"));
    assert!(names[1].starts_with("preview_002_overlaid_"));
    assert_eq!(report.rendered, 2);
}

#[test]
fn older_smaller_still_is_centered_with_side_padding() {
    let (ledger, mut storage) = two_version_fixture();
    let report = composite_frames(
        &ledger,
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    )
    .unwrap();

    // Block caption height 10 + padding 10.
    assert_eq!(
        report.canvas,
        Canvas {
            width: 200,
            height: 170,
            header_height: 20,
        }
    );

    let old = decode_frame(&storage, &report.frames[0]);
    assert_eq!(old.dimensions(), (200, 170));
    assert_eq!(old.get_pixel(49, 100).0, WHITE);
    assert_eq!(old.get_pixel(50, 100).0, RED);
    assert_eq!(old.get_pixel(149, 100).0, RED);
    assert_eq!(old.get_pixel(150, 100).0, WHITE);
    assert_eq!(old.get_pixel(50, 25).0, RED);
    assert_eq!(old.get_pixel(60, 125).0, WHITE);

    let new = decode_frame(&storage, &report.frames[1]);
    assert_eq!(new.dimensions(), (200, 170));
    assert_eq!(new.get_pixel(0, 20).0, BLUE);
    assert_eq!(new.get_pixel(199, 169).0, BLUE);
}

#[test]
fn caption_is_drawn_over_its_shadow_in_the_header() {
    let (ledger, mut storage) = two_version_fixture();
    let style = TimelapseConfig {
        shadow_rgba: [0, 200, 0, 255],
        ..TimelapseConfig::default()
    };
    let report =
        composite_frames(&ledger, &mut storage, &mut BlockCaption::default(), &style).unwrap();
    let frame = decode_frame(&storage, &report.frames[1]);

    // Text cell of "T" at (10, 10).
    assert_eq!(frame.get_pixel(10, 10).0, BLACK);
    assert_eq!(frame.get_pixel(14, 19).0, BLACK);
    // Shadow shows below-right of the text cell and spills onto the still.
    assert_eq!(frame.get_pixel(16, 21).0, [0, 200, 0, 255]);
    assert_eq!(frame.get_pixel(17, 21).0, BLUE);
    assert_eq!(frame.get_pixel(15, 12).0, [0, 200, 0, 255]);
    assert_eq!(frame.get_pixel(9, 9).0, WHITE);
}

#[test]
fn rerun_reuses_every_frame() {
    let (ledger, mut storage) = two_version_fixture();
    let style = TimelapseConfig::default();
    let first =
        composite_frames(&ledger, &mut storage, &mut BlockCaption::default(), &style).unwrap();
    let writes = storage.write_count();

    let second =
        composite_frames(&ledger, &mut storage, &mut BlockCaption::default(), &style).unwrap();

    assert_eq!(storage.write_count(), writes);
    assert_eq!(second.rendered, 0);
    assert_eq!(second.reused, 2);
    assert_eq!(first.frames, second.frames);
}

#[test]
fn changed_style_or_still_misses_the_cache() {
    let (ledger, mut storage) = two_version_fixture();
    let first = composite_frames(
        &ledger,
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    )
    .unwrap();

    let padded = TimelapseConfig {
        padding: 14,
        ..TimelapseConfig::default()
    };
    let second =
        composite_frames(&ledger, &mut storage, &mut BlockCaption::default(), &padded).unwrap();
    assert_eq!(second.rendered, 2);
    assert_ne!(first.frames, second.frames);
    assert_eq!(second.pruned, 2);
    for stale in &first.frames {
        assert!(!storage.exists(stale));
    }

    storage
        .write(Path::new("v/preview_001.png"), &png(100, 100, BLACK))
        .unwrap();
    let third =
        composite_frames(&ledger, &mut storage, &mut BlockCaption::default(), &padded).unwrap();
    assert_eq!(third.rendered, 1);
    assert_eq!(third.reused, 1);
    assert_eq!(third.pruned, 1);

    let mut listed = storage.list_dir(Path::new("v")).unwrap();
    listed.sort();
    let mut expected = vec![
        PathBuf::from("v/preview_001.png"),
        PathBuf::from("v/preview_002.png"),
    ];
    expected.extend(third.frames.iter().cloned());
    expected.sort();
    assert_eq!(listed, expected);
}

#[test]
fn pruning_leaves_other_stills_and_unrelated_files_alone() {
    let (ledger, mut storage) = two_version_fixture();
    let keep = [
        "v/preview_0010_overlaid_00000000000000aa.png",
        "v/preview_001_overlaid_notes.png",
        "v/preview_001_overlaid_00000000000000aa.txt",
    ];
    for p in keep {
        storage.write(Path::new(p), b"x").unwrap();
    }
    storage
        .write(
            Path::new("v/preview_001_overlaid_00000000000000aa.png"),
            b"stale",
        )
        .unwrap();

    let report = composite_frames(
        &ledger,
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    )
    .unwrap();

    assert_eq!(report.pruned, 1);
    assert!(!storage.exists(Path::new(
        "v/preview_001_overlaid_00000000000000aa.png"
    )));
    for p in keep {
        assert!(storage.exists(Path::new(p)), "{p}");
    }
}

#[test]
fn older_wider_still_widens_canvas_and_newest_is_centered() {
    let mut storage = MemStorage::new();
    storage
        .write(Path::new("v/preview_001.png"), &png(300, 80, RED))
        .unwrap();
    storage
        .write(Path::new("v/preview_002.png"), &png(200, 150, BLUE))
        .unwrap();
    let ledger = Ledger::new(vec![
        entry("v/preview_001.png", "2025-01-08T09:00:00Z"),
        entry("v/preview_002.png", "2025-01-09T14:52:00Z"),
    ]);

    let report = composite_frames(
        &ledger,
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    )
    .unwrap();
    assert_eq!(
        report.canvas,
        Canvas {
            width: 300,
            height: 170,
            header_height: 20,
        }
    );

    // The wide older still keeps its full width.
    let old = decode_frame(&storage, &report.frames[0]);
    assert_eq!(old.dimensions(), (300, 170));
    assert_eq!(old.get_pixel(0, 60).0, RED);
    assert_eq!(old.get_pixel(299, 60).0, RED);
    assert_eq!(old.get_pixel(299, 99).0, RED);
    assert_eq!(old.get_pixel(150, 100).0, WHITE);

    // The newest still sits centered with 50px on each side.
    let new = decode_frame(&storage, &report.frames[1]);
    assert_eq!(new.dimensions(), (300, 170));
    assert_eq!(new.get_pixel(49, 100).0, WHITE);
    assert_eq!(new.get_pixel(50, 100).0, BLUE);
    assert_eq!(new.get_pixel(249, 169).0, BLUE);
    assert_eq!(new.get_pixel(250, 100).0, WHITE);
}

#[test]
fn empty_ledger_is_rejected() {
    let mut storage = MemStorage::new();
    let res = composite_frames(
        &Ledger::default(),
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    );
    assert!(res.is_err());
}

#[test]
fn missing_still_is_an_error() {
    let mut storage = MemStorage::new();
    let ledger = Ledger::new(vec![entry("v/gone.png", "2025-01-08T09:00:00Z")]);
    let res = composite_frames(
        &ledger,
        &mut storage,
        &mut BlockCaption::default(),
        &TimelapseConfig::default(),
    );
    assert!(res.is_err());
}
