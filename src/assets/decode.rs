use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::RevlapseResult;

/// Decode encoded image bytes to straight-alpha RGBA8.
pub fn decode_rgba(bytes: &[u8]) -> RevlapseResult<image::RgbaImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(dyn_img.to_rgba8())
}

/// Read only the header of an encoded image to get its size.
pub fn image_dimensions(bytes: &[u8]) -> RevlapseResult<(u32, u32)> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("detect image format")?;
    Ok(reader.into_dimensions().context("read image dimensions")?)
}

/// Encode RGBA8 pixels as an opaque RGB PNG.
pub fn encode_png_rgb(img: &image::RgbaImage) -> RevlapseResult<Vec<u8>> {
    let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(buf)
}
