use std::path::Path;

use anyhow::Context as _;
use image::RgbaImage;

use crate::assets::font::{TextLayoutEngine, load_font_file};
use crate::config::{FONT_CANDIDATES, TimelapseConfig, first_existing_font};
use crate::foundation::error::{RevlapseError, RevlapseResult};
use crate::foundation::math::{blend_premul_over, mul_div255_u16};
use crate::render::fingerprint::{StableHasher, font_identity};

/// Pixel size of a rendered caption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptionExtent {
    /// Advance width in pixels.
    pub width: u32,
    /// Line height in pixels.
    pub height: u32,
}

/// Draws single-line captions onto frames.
pub trait CaptionRenderer {
    /// Size `text` would occupy when drawn.
    fn measure(&mut self, text: &str) -> RevlapseResult<CaptionExtent>;
    /// Draw `text` with its top-left corner at `(x, y)` in straight-alpha `rgba`.
    ///
    /// Pixels falling outside `canvas` are clipped.
    fn draw(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i64,
        y: i64,
        rgba: [u8; 4],
    ) -> RevlapseResult<()>;
    /// Stable identity of the font and size; part of every frame fingerprint.
    fn identity(&self) -> u64;
}

/// [`CaptionRenderer`] shaping with Parley and rasterizing with `vello_cpu`.
pub struct ParleyCaption {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
    identity: u64,
}

impl ParleyCaption {
    /// Load the font at `path`.
    pub fn from_path(path: &Path, size_px: f32) -> RevlapseResult<Self> {
        let bytes = load_font_file(path)?;
        Self::from_bytes(bytes, size_px)
    }

    /// Use in-memory font bytes.
    pub fn from_bytes(font_bytes: Vec<u8>, size_px: f32) -> RevlapseResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(RevlapseError::validation(
                "caption font size must be finite and > 0",
            ));
        }
        let engine = TextLayoutEngine::from_font_bytes(&font_bytes)?;
        tracing::debug!(family = engine.family_name(), size_px, "caption font loaded");
        let identity = font_identity(&font_bytes, size_px);
        let font = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            engine,
            font,
            size_px,
            identity,
        })
    }
}

impl CaptionRenderer for ParleyCaption {
    fn measure(&mut self, text: &str) -> RevlapseResult<CaptionExtent> {
        let layout = self.engine.layout_line(text, self.size_px)?;
        Ok(CaptionExtent {
            width: layout.width().ceil().max(0.0) as u32,
            height: layout.height().ceil().max(0.0) as u32,
        })
    }

    fn draw(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i64,
        y: i64,
        rgba: [u8; 4],
    ) -> RevlapseResult<()> {
        let layout = self.engine.layout_line(text, self.size_px)?;
        // Room for glyph overhang past the layout box (italics, descenders).
        let margin = (self.size_px / 2.0).ceil() as u32;
        let w = layout.width().ceil().max(1.0) as u32 + 2 * margin;
        let h = layout.height().ceil().max(1.0) as u32 + 2 * margin;
        let w16 = u16::try_from(w)
            .map_err(|_| RevlapseError::validation(format!("caption width {w} exceeds u16")))?;
        let h16 = u16::try_from(h)
            .map_err(|_| RevlapseError::validation(format!("caption height {h} exceeds u16")))?;

        let mut ctx = vello_cpu::RenderContext::new(w16, h16);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(margin),
            f64::from(margin),
        )));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
            rgba[0], rgba[1], rgba[2], rgba[3],
        ));
        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let mut pen_x = run.offset();
                let baseline = run.baseline();
                let glyphs = run.glyphs().map(|g| {
                    let glyph = vello_cpu::Glyph {
                        id: g.id,
                        x: pen_x + g.x,
                        y: baseline - g.y,
                    };
                    pen_x += g.advance;
                    glyph
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }
        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w16, h16);
        ctx.render_to_pixmap(&mut pixmap);

        blit_premul(
            canvas,
            pixmap.data_as_u8_slice(),
            w,
            h,
            x - i64::from(margin),
            y - i64::from(margin),
        );
        Ok(())
    }

    fn identity(&self) -> u64 {
        self.identity
    }
}

/// Caption renderer for `style`: Parley over the resolved font file, or [`BlockCaption`] when no
/// font file can be found.
///
/// An explicitly configured font that fails to load is an error.
pub fn caption_for_style(style: &TimelapseConfig) -> RevlapseResult<Box<dyn CaptionRenderer>> {
    caption_with_candidates(style, &FONT_CANDIDATES)
}

pub(crate) fn caption_with_candidates(
    style: &TimelapseConfig,
    candidates: &[&str],
) -> RevlapseResult<Box<dyn CaptionRenderer>> {
    let path = match &style.font_path {
        Some(_) => style.resolve_font_path(),
        None => first_existing_font(candidates),
    };
    match path {
        Some(path) => {
            let caption = ParleyCaption::from_path(&path, style.font_size)
                .with_context(|| format!("load caption font '{}'", path.display()))?;
            Ok(Box::new(caption))
        }
        None => {
            tracing::warn!(
                tried = candidates.len(),
                "no caption font found, using block captions; pass --font to choose one"
            );
            Ok(Box::new(BlockCaption::for_size(style.font_size)))
        }
    }
}

/// Font-free [`CaptionRenderer`] drawing one solid cell per non-space character.
///
/// Deterministic down to the pixel, which makes it useful wherever a real font is unavailable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockCaption {
    /// Advance of every character.
    pub cell_width: u32,
    /// Height of every character.
    pub cell_height: u32,
}

impl Default for BlockCaption {
    fn default() -> Self {
        Self {
            cell_width: 6,
            cell_height: 10,
        }
    }
}

impl BlockCaption {
    /// Cells proportioned like a sans-serif face at `size_px`.
    pub fn for_size(size_px: f32) -> Self {
        Self {
            cell_width: (size_px * 0.6).round().max(2.0) as u32,
            cell_height: size_px.round().max(1.0) as u32,
        }
    }
}

impl CaptionRenderer for BlockCaption {
    fn measure(&mut self, text: &str) -> RevlapseResult<CaptionExtent> {
        Ok(CaptionExtent {
            width: self.cell_width * text.chars().count() as u32,
            height: self.cell_height,
        })
    }

    fn draw(
        &mut self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i64,
        y: i64,
        rgba: [u8; 4],
    ) -> RevlapseResult<()> {
        let a = u16::from(rgba[3]);
        let premul = [
            mul_div255_u16(u16::from(rgba[0]), a) as u8,
            mul_div255_u16(u16::from(rgba[1]), a) as u8,
            mul_div255_u16(u16::from(rgba[2]), a) as u8,
            rgba[3],
        ];
        // One pixel of spacing between cells keeps characters countable.
        let ink_width = self.cell_width.saturating_sub(1).max(1);
        let mut cell = Vec::with_capacity((ink_width * self.cell_height * 4) as usize);
        for _ in 0..ink_width * self.cell_height {
            cell.extend_from_slice(&premul);
        }
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let cx = x + i64::from(self.cell_width) * i as i64;
            blit_premul(canvas, &cell, ink_width, self.cell_height, cx, y);
        }
        Ok(())
    }

    fn identity(&self) -> u64 {
        let mut h = StableHasher::new();
        h.write_str("block");
        h.write_u32(self.cell_width);
        h.write_u32(self.cell_height);
        h.finish()
    }
}

/// Source-over a premultiplied RGBA8 buffer onto an opaque canvas at `(x, y)`, clipped.
pub(crate) fn blit_premul(
    canvas: &mut RgbaImage,
    src_premul: &[u8],
    src_w: u32,
    src_h: u32,
    x: i64,
    y: i64,
) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));
    let stride = canvas.width() as usize * 4;
    let dst: &mut [u8] = &mut **canvas;
    for sy in 0..i64::from(src_h) {
        let dy = y + sy;
        if dy < 0 || dy >= ch {
            continue;
        }
        for sx in 0..i64::from(src_w) {
            let dx = x + sx;
            if dx < 0 || dx >= cw {
                continue;
            }
            let si = ((sy * i64::from(src_w) + sx) * 4) as usize;
            let Some(px) = src_premul.get(si..si + 4) else {
                continue;
            };
            if px[3] == 0 {
                continue;
            }
            let di = dy as usize * stride + dx as usize * 4;
            blend_premul_over(&mut dst[di..di + 4], [px[0], px[1], px[2], px[3]]);
        }
    }
}
