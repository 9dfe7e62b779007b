use crate::foundation::error::{ShotframeError, ShotframeResult};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }
}

/// Straight-alpha RGBA8 pixel buffer, row-major, 4 bytes per pixel.
///
/// This is the interchange type at both ends of the pipeline: decoded uploads
/// enter the trim preprocessor and compositor as one, and the finished
/// composite leaves as one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Straight-alpha RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Create a validated image; `data` must be exactly `width * height * 4` bytes.
    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> ShotframeResult<Self> {
        let expected = (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4);
        if data.len() != expected {
            return Err(ShotframeError::invalid_input(format!(
                "raster data is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Return `true` when the image has no pixels or an inconsistent buffer.
    pub fn is_degenerate(&self) -> bool {
        let expected = (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4);
        self.width == 0 || self.height == 0 || self.data.len() != expected
    }

    /// Straight alpha of the pixel at `(x, y)`. Callers must stay in bounds.
    pub(crate) fn alpha_at(&self, x: u32, y: u32) -> u8 {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        self.data[idx + 3]
    }
}
