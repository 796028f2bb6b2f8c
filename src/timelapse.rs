//! Timelapse assembly: frames in, video out.
//!
//! The video is the frame sequence at the configured rate, then the final frame held, then a fade
//! from the final frame to the fade color. Every frame is emitted at least once and in order.

use std::path::PathBuf;

use anyhow::Context as _;
use image::RgbaImage;

use crate::assets::decode::decode_rgba;
use crate::config::TimelapseConfig;
use crate::encode::sink::{FrameRGBA, FrameSink, SinkConfig};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{RevlapseError, RevlapseResult};
use crate::foundation::math::lerp_rgb;
use crate::storage::Storage;

/// Frame counts of the three segments of a timelapse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelapsePlan {
    /// Playback rate.
    pub fps: Fps,
    /// One video frame per version.
    pub main: u64,
    /// Repeats of the final version.
    pub hold: u64,
    /// Frames fading the final version out.
    pub fade: u64,
}

impl TimelapsePlan {
    /// Plan a video of `versions` frames under `cfg`.
    pub fn new(versions: usize, cfg: &TimelapseConfig) -> RevlapseResult<Self> {
        let fps = cfg.fps()?;
        Ok(Self {
            fps,
            main: versions as u64,
            hold: fps.secs_to_frames_round(cfg.hold_secs),
            fade: fps.secs_to_frames_round(cfg.fade_secs),
        })
    }

    /// Total number of video frames.
    pub fn total_frames(&self) -> u64 {
        self.main + self.hold + self.fade
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.fps.frames_to_secs(self.total_frames())
    }
}

/// What [`assemble_timelapse`] produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssembleStats {
    /// Segment frame counts.
    pub plan: TimelapsePlan,
    /// Output width, even.
    pub width: u32,
    /// Output height, even.
    pub height: u32,
}

/// Encode `frames` (chronological frame files) into a timelapse through `sink`.
pub fn assemble_timelapse(
    frames: &[PathBuf],
    storage: &dyn Storage,
    sink: &mut dyn FrameSink,
    cfg: &TimelapseConfig,
) -> RevlapseResult<AssembleStats> {
    cfg.validate()?;
    let Some(last_path) = frames.last() else {
        return Err(RevlapseError::validation("no frames to assemble"));
    };
    let plan = TimelapsePlan::new(frames.len(), cfg)?;

    let last = load_frame(storage, last_path)?;
    let width = round_up_even(last.width());
    let height = round_up_even(last.height());
    if (width, height) != last.dimensions() {
        tracing::info!(
            from_w = last.width(),
            from_h = last.height(),
            width,
            height,
            "padding output to even dimensions"
        );
    }

    tracing::info!(
        frames = plan.total_frames(),
        duration_secs = plan.duration_secs(),
        width,
        height,
        "assembling timelapse"
    );
    sink.begin(SinkConfig {
        width,
        height,
        fps: plan.fps,
    })?;

    let mut idx = 0u64;
    let n = frames.len();
    for (i, path) in frames.iter().enumerate() {
        let img = if i + 1 == n {
            last.clone()
        } else {
            load_frame(storage, path)?
        };
        if img.dimensions() != last.dimensions() {
            tracing::debug!(path = %path.display(), "frame size differs, centering");
        }
        sink.push_frame(FrameIndex(idx), &fit(&img, width, height, cfg.background_rgb))?;
        idx += 1;
    }

    let final_frame = fit(&last, width, height, cfg.background_rgb);
    for _ in 0..plan.hold {
        sink.push_frame(FrameIndex(idx), &final_frame)?;
        idx += 1;
    }
    for k in 0..plan.fade {
        let t = (k + 1) as f64 / plan.fade as f64;
        sink.push_frame(FrameIndex(idx), &fade_toward(&final_frame, cfg.fade_rgb, t))?;
        idx += 1;
    }
    sink.end()?;

    Ok(AssembleStats {
        plan,
        width,
        height,
    })
}

fn load_frame(storage: &dyn Storage, path: &std::path::Path) -> RevlapseResult<RgbaImage> {
    let bytes = storage.read(path)?;
    Ok(decode_rgba(&bytes).with_context(|| format!("decode frame '{}'", path.display()))?)
}

fn round_up_even(v: u32) -> u32 {
    v + (v & 1)
}

/// Center `img` on a `width x height` background; anything outside is clipped.
fn fit(img: &RgbaImage, width: u32, height: u32, background: [u8; 3]) -> FrameRGBA {
    if img.dimensions() == (width, height) {
        let mut out = img.clone();
        for px in out.pixels_mut() {
            px.0[3] = 255;
        }
        return FrameRGBA::from_image(out);
    }
    let [r, g, b] = background;
    let mut out = RgbaImage::from_pixel(width, height, image::Rgba([r, g, b, 255]));
    let dx = (i64::from(width) - i64::from(img.width())) / 2;
    let dy = (i64::from(height) - i64::from(img.height())) / 2;
    image::imageops::replace(&mut out, img, dx, dy);
    for px in out.pixels_mut() {
        px.0[3] = 255;
    }
    FrameRGBA::from_image(out)
}

fn fade_toward(frame: &FrameRGBA, target: [u8; 3], t: f64) -> FrameRGBA {
    let mut out = frame.clone();
    for px in out.data.chunks_exact_mut(4) {
        let [r, g, b] = lerp_rgb([px[0], px[1], px[2]], target, t);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/timelapse.rs"]
mod tests;
