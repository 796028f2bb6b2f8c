//! Encoding sinks.
//!
//! Sinks consume assembled frames in playback order and are fed by
//! [`assemble_timelapse`](crate::timelapse::assemble_timelapse).

/// `ffmpeg`-based sink (MP4 output via system `ffmpeg`).
pub mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
