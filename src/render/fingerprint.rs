use xxhash_rust::xxh3::Xxh3;

use crate::config::TimelapseConfig;
use crate::foundation::core::Canvas;
use crate::foundation::timestamp::Timestamp;

const XXH3_SEED: u64 = 0x5f3a_91c2_07e4_b86d;

/// Content hash of everything that affects the pixels of one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameFingerprint(pub u64);

impl FrameFingerprint {
    /// Tag embedded in frame file names.
    pub fn file_tag(self) -> u64 {
        self.0
    }
}

/// Fingerprint one frame: the still's encoded bytes, the run canvas, the caption renderer, the
/// caption style and the timestamp text.
pub(crate) fn fingerprint_frame(
    still: &[u8],
    canvas: Canvas,
    caption_identity: u64,
    style: &TimelapseConfig,
    timestamp: &Timestamp,
) -> FrameFingerprint {
    let mut h = StableHasher::new();
    h.write_u64(still.len() as u64);
    h.write_bytes(still);

    h.write_u32(canvas.width);
    h.write_u32(canvas.height);
    h.write_u32(canvas.header_height);

    h.write_u64(caption_identity);
    h.write_f32(style.font_size);
    h.write_u32(style.padding);
    h.write_u32(style.shadow_offset);
    h.write_bytes(&style.text_rgba);
    h.write_bytes(&style.shadow_rgba);
    h.write_bytes(&style.background_rgb);

    h.write_str(&timestamp.caption());
    FrameFingerprint(h.finish())
}

/// Identity of a caption font at a given size.
pub(crate) fn font_identity(font_bytes: &[u8], size_px: f32) -> u64 {
    let mut h = StableHasher::new();
    h.write_bytes(font_bytes);
    h.write_f32(size_px);
    h.finish()
}

pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_f32(&mut self, v: f32) {
        self.write_u32(v.to_bits());
    }

    /// Length-prefixed so adjacent strings cannot alias.
    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    pub(crate) fn finish(self) -> u64 {
        self.inner.digest()
    }
}
