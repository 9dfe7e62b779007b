//! Border-trim preprocessor.
//!
//! Crops uniform transparent padding from an uploaded image before it enters
//! the compositor. Best-effort by contract: every failure path returns the
//! input unchanged, so callers never branch on an error.

use crate::foundation::core::RasterImage;

/// Crop `image` to the tight bounding box of pixels with non-zero alpha.
///
/// Returns the input unchanged when the image is fully transparent, already
/// tight, or internally inconsistent. Idempotent: a second call over the
/// result is always the identity.
#[tracing::instrument(skip(image), fields(w = image.width, h = image.height))]
pub fn trim(image: &RasterImage) -> RasterImage {
    match tight_bounds(image) {
        Some((left, top, right, bottom))
            if right - left < image.width || bottom - top < image.height =>
        {
            crop(image, left, top, right, bottom)
        }
        _ => image.clone(),
    }
}

/// Bounding box `[left, right) x [top, bottom)` of non-transparent content,
/// or `None` when there is none (or the buffer is inconsistent).
fn tight_bounds(image: &RasterImage) -> Option<(u32, u32, u32, u32)> {
    if image.is_degenerate() {
        return None;
    }
    let (w, h) = (image.width, image.height);

    let row_has_content = |y: u32| (0..w).any(|x| image.alpha_at(x, y) != 0);

    let top = (0..h).find(|&y| row_has_content(y))?;
    // Content exists, so the reverse scans below always find a hit.
    let bottom = (0..h).rev().find(|&y| row_has_content(y))? + 1;

    let col_has_content = |x: u32| (top..bottom).any(|y| image.alpha_at(x, y) != 0);
    let left = (0..w).find(|&x| col_has_content(x))?;
    let right = (0..w).rev().find(|&x| col_has_content(x))? + 1;

    Some((left, top, right, bottom))
}

fn crop(image: &RasterImage, left: u32, top: u32, right: u32, bottom: u32) -> RasterImage {
    let out_w = right - left;
    let out_h = bottom - top;
    let mut data = Vec::with_capacity((out_w as usize) * (out_h as usize) * 4);
    for y in top..bottom {
        let row_start = ((y as usize) * (image.width as usize) + (left as usize)) * 4;
        let row_end = row_start + (out_w as usize) * 4;
        data.extend_from_slice(&image.data[row_start..row_end]);
    }
    RasterImage {
        width: out_w,
        height: out_h,
        data,
    }
}
