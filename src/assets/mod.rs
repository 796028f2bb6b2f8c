//! Source material for frames: still conversion, image decoding and caption fonts.

/// Revision-to-PNG converters.
pub mod convert;
/// Image decode/encode helpers.
pub mod decode;
/// Caption font loading and text layout.
pub mod font;
