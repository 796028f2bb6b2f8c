//! Converting one stored revision into a canonical PNG still.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::Context as _;

use crate::foundation::error::{RevlapseError, RevlapseResult};

/// Turns the raw bytes of one revision into PNG bytes.
pub trait FormatConverter {
    /// Short name for logs.
    fn name(&self) -> &'static str;
    /// Convert raw revision bytes to an encoded PNG.
    fn convert(&self, raw: &[u8]) -> RevlapseResult<Vec<u8>>;
}

/// PNG revisions are already stills; copy them through.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngCopy;

impl FormatConverter for PngCopy {
    fn name(&self) -> &'static str {
        "copy"
    }

    fn convert(&self, raw: &[u8]) -> RevlapseResult<Vec<u8>> {
        Ok(raw.to_vec())
    }
}

/// Rasterize the first page of a PDF with poppler's `pdftoppm`.
#[derive(Clone, Copy, Debug)]
pub struct PdfRasterizer {
    /// Output resolution in dots per inch.
    pub dpi: u32,
}

impl FormatConverter for PdfRasterizer {
    fn name(&self) -> &'static str {
        "pdftoppm"
    }

    fn convert(&self, raw: &[u8]) -> RevlapseResult<Vec<u8>> {
        let dir = tempfile::tempdir().context("create pdf scratch directory")?;
        let input = dir.path().join("revision.pdf");
        std::fs::write(&input, raw).context("write pdf scratch file")?;
        let out_root = dir.path().join("page");

        let out = Command::new("pdftoppm")
            .args(["-png", "-r", &self.dpi.to_string(), "-f", "1", "-l", "1"])
            .arg("-singlefile")
            .arg(&input)
            .arg(&out_root)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                RevlapseError::evaluation(format!(
                    "failed to run pdftoppm (is poppler installed and on PATH?): {e}"
                ))
            })?;
        if !out.status.success() {
            return Err(RevlapseError::evaluation(format!(
                "pdftoppm exited with status {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        let png = out_root.with_extension("png");
        Ok(std::fs::read(&png)
            .with_context(|| format!("read rasterized page '{}'", png.display()))?)
    }
}

/// Converters keyed by lower-case source extension (with the leading dot).
pub struct ConverterRegistry {
    by_ext: BTreeMap<&'static str, Box<dyn FormatConverter>>,
}

impl ConverterRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            by_ext: BTreeMap::new(),
        }
    }

    /// `.pdf` rasterized at `pdf_dpi`, `.png` copied.
    pub fn standard(pdf_dpi: u32) -> Self {
        Self::new()
            .with(".pdf", PdfRasterizer { dpi: pdf_dpi })
            .with(".png", PngCopy)
    }

    /// Register `converter` for `ext`.
    pub fn with(mut self, ext: &'static str, converter: impl FormatConverter + 'static) -> Self {
        self.by_ext.insert(ext, Box::new(converter));
        self
    }

    /// Supported extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_ext.keys().copied()
    }

    /// Pick the converter for a document path by its extension.
    ///
    /// Returns the normalized extension alongside the converter.
    pub fn resolve(&self, doc_path: &str) -> RevlapseResult<(String, &dyn FormatConverter)> {
        let ext = extension_of(doc_path);
        match self.by_ext.get(ext.as_str()) {
            Some(c) => Ok((ext, c.as_ref())),
            None => Err(RevlapseError::unsupported_format(ext, self.extensions())),
        }
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn extension_of(doc_path: &str) -> String {
    Path::new(doc_path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_ascii_lowercase()))
        .unwrap_or_default()
}

/// Return `true` when `pdftoppm` can be invoked from `PATH`.
pub fn is_pdftoppm_on_path() -> bool {
    Command::new("pdftoppm")
        .arg("-v")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/assets/convert.rs"]
mod tests;
