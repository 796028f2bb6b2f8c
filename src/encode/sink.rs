use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{RevlapseError, RevlapseResult};

/// One opaque video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major, alpha always 255.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Wrap an opaque image.
    pub fn from_image(img: image::RgbaImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            data: img.into_raw(),
        }
    }

    #[cfg(test)]
    pub(crate) fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            data.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Check the buffer length against the declared size.
    pub fn validate(&self) -> RevlapseResult<()> {
        if self.data.len() != (self.width as usize) * (self.height as usize) * 4 {
            return Err(RevlapseError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }
        Ok(())
    }
}

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Output frames-per-second.
    pub fps: Fps,
}

/// Sink contract for consuming frames in playback order.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order.
pub trait FrameSink {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> RevlapseResult<()>;
    /// Push one frame in strictly increasing playback order.
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RevlapseResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> RevlapseResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    finished: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    /// `true` once `end` has been called.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Playback length of the captured frames.
    pub fn duration_secs(&self) -> f64 {
        self.cfg
            .as_ref()
            .map(|c| c.fps.frames_to_secs(self.frames.len() as u64))
            .unwrap_or(0.0)
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> RevlapseResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> RevlapseResult<()> {
        frame.validate()?;
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> RevlapseResult<()> {
        self.finished = true;
        Ok(())
    }
}
