//! Run configuration.
//!
//! Every tunable of the pipeline lives here with a documented default. A JSON file can override
//! any subset of fields; unknown fields are rejected so typos do not silently fall back to
//! defaults.

use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::core::Fps;
use crate::foundation::error::{RevlapseError, RevlapseResult};

/// Hard ceiling the revision-history API places on a single listing.
pub const MAX_REVISIONS: u32 = 100;

/// Font locations searched when no caption font is configured.
pub const FONT_CANDIDATES: [&str; 12] = [
    "~/Library/Fonts/DejaVuSans.ttf",
    "/Library/Fonts/DejaVuSans.ttf",
    "~/.local/share/fonts/DejaVuSans.ttf",
    "~/.fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/local/share/fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:/Windows/Fonts/arial.ttf",
];

/// Top-level configuration, one section per pipeline half.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Collection settings.
    pub collect: CollectConfig,
    /// Compositing and assembly settings.
    pub timelapse: TimelapseConfig,
}

impl Config {
    /// Load a JSON config file; missing fields keep their defaults.
    pub fn load(path: &Path) -> RevlapseResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text).map_err(|e| {
            RevlapseError::serde(format!("config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> RevlapseResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> RevlapseResult<()> {
        self.collect.validate()?;
        self.timelapse.validate()
    }
}

/// Settings for the version collectors.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectConfig {
    /// Rasterization resolution for PDF revisions.
    pub pdf_dpi: u32,
    /// Requested revision listing size, clamped to [`MAX_REVISIONS`].
    pub revision_limit: u32,
    /// Per-request HTTP timeout; `None` waits indefinitely.
    pub http_timeout_secs: Option<u64>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            pdf_dpi: 200,
            revision_limit: MAX_REVISIONS,
            http_timeout_secs: Some(60),
        }
    }
}

impl CollectConfig {
    /// Check value ranges.
    pub fn validate(&self) -> RevlapseResult<()> {
        if self.pdf_dpi == 0 {
            return Err(RevlapseError::validation("collect.pdf_dpi must be > 0"));
        }
        if self.revision_limit == 0 {
            return Err(RevlapseError::validation(
                "collect.revision_limit must be > 0",
            ));
        }
        Ok(())
    }
}

/// Settings for the frame compositor and the timelapse assembler.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimelapseConfig {
    /// Caption font file; searched for in [`FONT_CANDIDATES`] when unset.
    pub font_path: Option<PathBuf>,
    /// Caption font size in pixels.
    pub font_size: f32,
    /// Gap between canvas edge and caption, also added below the caption.
    pub padding: u32,
    /// Shadow displacement, in pixels along both axes.
    pub shadow_offset: u32,
    /// Caption color (RGBA8).
    pub text_rgba: [u8; 4],
    /// Caption shadow color (RGBA8).
    pub shadow_rgba: [u8; 4],
    /// Canvas fill behind and around each still (RGB8).
    pub background_rgb: [u8; 3],
    /// Playback rate of the version sequence.
    pub fps: u32,
    /// How long the final version stays on screen.
    pub hold_secs: f64,
    /// Length of the closing fade.
    pub fade_secs: f64,
    /// Color the closing fade ends on (RGB8).
    pub fade_rgb: [u8; 3],
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            font_size: 24.0,
            padding: 10,
            shadow_offset: 2,
            text_rgba: [0, 0, 0, 255],
            shadow_rgba: [255, 255, 255, 255],
            background_rgb: [255, 255, 255],
            fps: 1,
            hold_secs: 5.0,
            fade_secs: 2.0,
            fade_rgb: [0, 0, 0],
        }
    }
}

impl TimelapseConfig {
    /// Check value ranges.
    pub fn validate(&self) -> RevlapseResult<()> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(RevlapseError::validation(
                "timelapse.font_size must be finite and > 0",
            ));
        }
        Fps::whole(self.fps)?;
        for (name, v) in [("hold_secs", self.hold_secs), ("fade_secs", self.fade_secs)] {
            if !v.is_finite() || v < 0.0 {
                return Err(RevlapseError::validation(format!(
                    "timelapse.{name} must be finite and >= 0"
                )));
            }
        }
        Ok(())
    }

    /// Playback rate as a validated [`Fps`].
    pub fn fps(&self) -> RevlapseResult<Fps> {
        Fps::whole(self.fps)
    }

    /// The caption font: the configured path, else the first existing [`FONT_CANDIDATES`] entry.
    ///
    /// `None` when nothing is configured and no candidate exists.
    pub fn resolve_font_path(&self) -> Option<PathBuf> {
        match &self.font_path {
            Some(p) => Some(expand_home(p)),
            None => first_existing_font(&FONT_CANDIDATES),
        }
    }
}

pub(crate) fn first_existing_font(candidates: &[&str]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|c| expand_home(Path::new(c)))
        .find(|p| p.is_file())
}

fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}
