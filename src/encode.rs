//! Decode at the entry of the pipeline, PNG encode at the exit.

use image::ImageEncoder as _;

use crate::foundation::core::RasterImage;
use crate::foundation::error::{ShotframeError, ShotframeResult};

/// Decode an image file (PNG, JPEG, WebP, ...) into straight RGBA8.
///
/// The container format is sniffed from the bytes; decode failures surface as
/// [`ShotframeError::Decode`].
pub fn decode_image(bytes: &[u8]) -> ShotframeResult<RasterImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| ShotframeError::decode(format!("image decode failed: {e}")))?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    RasterImage::from_rgba8(width, height, rgba.into_raw())
}

/// Encode an image as PNG (RGBA8, straight alpha).
pub fn encode_png(image: &RasterImage) -> ShotframeResult<Vec<u8>> {
    if image.is_degenerate() {
        return Err(ShotframeError::invalid_input(
            "cannot encode an empty or inconsistent image",
        ));
    }
    let mut out = Vec::new();
    image::codecs::png::PngEncoder::new(&mut out)
        .write_image(
            &image.data,
            image.width,
            image.height,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| ShotframeError::surface(format!("png encode failed: {e}")))?;
    Ok(out)
}
