use std::path::Path;

use anyhow::Context as _;

use crate::foundation::error::{RevlapseError, RevlapseResult};

/// Brush carried through Parley layouts.
///
/// Captions pick their paint at draw time, so the layout brush holds no color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct CaptionBrush;

/// Read a TrueType/OpenType font file.
pub fn load_font_file(path: &Path) -> RevlapseResult<Vec<u8>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read font file '{}'", path.display()))?;
    if bytes.is_empty() {
        return Err(RevlapseError::validation(format!(
            "font file '{}' is empty",
            path.display()
        )));
    }
    Ok(bytes)
}

/// Parley contexts bound to a single registered font family.
///
/// The family is registered once at construction; every layout afterwards resolves to it.
pub(crate) struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<CaptionBrush>,
    family_name: String,
}

impl TextLayoutEngine {
    /// Register `font_bytes` and remember the family it provides.
    pub(crate) fn from_font_bytes(font_bytes: &[u8]) -> RevlapseResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            RevlapseError::validation("no font families registered from font bytes")
        })?;
        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| RevlapseError::validation("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    /// Family name the engine lays text out with.
    pub(crate) fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape `text` as a single unwrapped line.
    pub(crate) fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
    ) -> RevlapseResult<parley::Layout<CaptionBrush>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(RevlapseError::validation(
                "text size_px must be finite and > 0",
            ));
        }

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(CaptionBrush));

        let mut layout: parley::Layout<CaptionBrush> = builder.build(text);
        layout.break_all_lines(None);
        Ok(layout)
    }
}
