use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::RgbaImage;

use crate::assets::decode::{decode_rgba, encode_png_rgb, image_dimensions};
use crate::config::TimelapseConfig;
use crate::foundation::core::Canvas;
use crate::foundation::error::{RevlapseError, RevlapseResult};
use crate::foundation::math::mul_div255_u16;
use crate::foundation::timestamp::Timestamp;
use crate::ledger::Ledger;
use crate::render::caption::{CaptionRenderer, blit_premul};
use crate::render::fingerprint::fingerprint_frame;
use crate::storage::Storage;

/// Result of compositing a ledger into frames.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeReport {
    /// Frame files in chronological order, one per ledger entry.
    pub frames: Vec<PathBuf>,
    /// Canvas every frame was rendered on.
    pub canvas: Canvas,
    /// Frames drawn in this run.
    pub rendered: usize,
    /// Frames found already on disk.
    pub reused: usize,
    /// Stale frames of re-rendered stills that were deleted.
    pub pruned: usize,
}

/// Size the canvas shared by every frame of a run.
///
/// The body is as large as the largest still so nothing is ever cropped; the header band holds
/// the caption plus `padding` below it.
pub fn compute_canvas(
    still_sizes: &[(u32, u32)],
    caption_height: u32,
    padding: u32,
) -> RevlapseResult<Canvas> {
    let width = still_sizes.iter().map(|(w, _)| *w).max().unwrap_or(0);
    let body = still_sizes.iter().map(|(_, h)| *h).max().unwrap_or(0);
    if width == 0 || body == 0 {
        return Err(RevlapseError::validation(
            "cannot size a canvas without any non-empty still",
        ));
    }
    let header_height = caption_height + padding;
    Ok(Canvas {
        width,
        height: body + header_height,
        header_height,
    })
}

/// Cache file for one frame: `{stem}_overlaid_{tag:016x}.png` next to the still.
pub fn frame_path(still: &Path, tag: u64) -> PathBuf {
    let stem = still
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    still.with_file_name(format!("{stem}_overlaid_{tag:016x}.png"))
}

/// Delete frames of `still` rendered under an older fingerprint, keeping `keep`.
fn prune_stale_frames(
    storage: &mut dyn Storage,
    still: &Path,
    keep: &Path,
) -> RevlapseResult<usize> {
    let dir = still.parent().unwrap_or(Path::new(""));
    let stale: Vec<PathBuf> = storage
        .list_dir(dir)?
        .into_iter()
        .filter(|p| p.as_path() != keep && is_frame_of(still, p))
        .collect();
    for p in &stale {
        tracing::debug!(path = %p.display(), "removing stale frame");
        storage.remove(p)?;
    }
    Ok(stale.len())
}

/// `true` when `candidate` is named like a [`frame_path`] of `still`.
fn is_frame_of(still: &Path, candidate: &Path) -> bool {
    let (Some(stem), Some(name)) = (
        still.file_stem().and_then(|s| s.to_str()),
        candidate.file_name().and_then(|s| s.to_str()),
    ) else {
        return false;
    };
    name.strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix("_overlaid_"))
        .and_then(|rest| rest.strip_suffix(".png"))
        .is_some_and(|tag| tag.len() == 16 && tag.bytes().all(|b| b.is_ascii_hexdigit()))
}

/// Draw one frame: background, still centered under the header band, shadowed caption.
pub fn render_frame(
    still: &RgbaImage,
    timestamp: &Timestamp,
    canvas: Canvas,
    caption: &mut dyn CaptionRenderer,
    style: &TimelapseConfig,
) -> RevlapseResult<RgbaImage> {
    let [r, g, b] = style.background_rgb;
    let mut frame = RgbaImage::from_pixel(canvas.width, canvas.height, image::Rgba([r, g, b, 255]));

    let x = (i64::from(canvas.width) - i64::from(still.width())) / 2;
    let premul = premultiply(still);
    blit_premul(
        &mut frame,
        &premul,
        still.width(),
        still.height(),
        x,
        i64::from(canvas.header_height),
    );

    let text = timestamp.caption();
    let pad = i64::from(style.padding);
    let shadow = pad + i64::from(style.shadow_offset);
    caption.draw(&mut frame, &text, shadow, shadow, style.shadow_rgba)?;
    caption.draw(&mut frame, &text, pad, pad, style.text_rgba)?;
    Ok(frame)
}

/// Turn every ledger entry into a captioned, uniformly sized frame.
///
/// Entries are sorted by timestamp first. Frames are cached under a content hash of their inputs,
/// so re-running with unchanged inputs draws nothing and a changed input never serves a stale
/// frame.
pub fn composite_frames(
    ledger: &Ledger,
    storage: &mut dyn Storage,
    caption: &mut dyn CaptionRenderer,
    style: &TimelapseConfig,
) -> RevlapseResult<CompositeReport> {
    let entries = ledger.sorted();
    let Some(newest) = entries.last() else {
        return Err(RevlapseError::validation("ledger has no entries to composite"));
    };

    let mut sizes = Vec::with_capacity(entries.len());
    for e in &entries {
        let bytes = storage.read(&e.path)?;
        let dims = image_dimensions(&bytes)
            .with_context(|| format!("read size of still '{}'", e.path.display()))?;
        sizes.push(dims);
    }
    let extent = caption.measure(&newest.timestamp.caption())?;
    let canvas = compute_canvas(&sizes, extent.height, style.padding)?;
    if let Some(&(w, h)) = sizes.last()
        && (w, h) != (canvas.width, canvas.body_height())
    {
        tracing::info!(
            newest_w = w,
            newest_h = h,
            canvas_w = canvas.width,
            canvas_h = canvas.body_height(),
            "an older still is larger than the newest one; canvas widened to fit"
        );
    }
    tracing::info!(
        width = canvas.width,
        height = canvas.height,
        header = canvas.header_height,
        "canvas sized"
    );

    let identity = caption.identity();
    let n = entries.len();
    let mut report = CompositeReport {
        frames: Vec::with_capacity(n),
        canvas,
        rendered: 0,
        reused: 0,
        pruned: 0,
    };
    for (i, e) in entries.iter().enumerate() {
        let bytes = storage.read(&e.path)?;
        let fp = fingerprint_frame(&bytes, canvas, identity, style, &e.timestamp);
        let out = frame_path(&e.path, fp.file_tag());

        if storage.exists(&out) {
            tracing::debug!(path = %out.display(), "frame cached");
            report.reused += 1;
        } else {
            tracing::info!("{:03} / {n}. Captioning {} ...", i + 1, e.path.display());
            let still = decode_rgba(&bytes)
                .with_context(|| format!("decode still '{}'", e.path.display()))?;
            let frame = render_frame(&still, &e.timestamp, canvas, caption, style)?;
            storage.write(&out, &encode_png_rgb(&frame)?)?;
            report.rendered += 1;
            report.pruned += prune_stale_frames(storage, &e.path, &out)?;
        }
        report.frames.push(out);
    }
    Ok(report)
}

fn premultiply(img: &RgbaImage) -> Vec<u8> {
    let mut out = img.as_raw().clone();
    for px in out.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = mul_div255_u16(u16::from(*c), a) as u8;
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
