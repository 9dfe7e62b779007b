//! Shotframe is a deterministic offline compositor that frames screenshots on
//! decorative backgrounds.
//!
//! The pipeline has two halves:
//!
//! - [`trim`] crops uniform transparent padding from an uploaded image
//! - [`Compositor::render`] composes the (optionally trimmed) image onto a
//!   canvas whose long edge is always 2400 px: background fill, film grain,
//!   frame style treatment, drop shadow, and rounded-corner clipping
//!
//! ```no_run
//! # fn main() -> shotframe::ShotframeResult<()> {
//! let bytes = std::fs::read("screenshot.png").expect("read input");
//! let image = shotframe::trim(&shotframe::decode_image(&bytes)?);
//! let out = shotframe::render(&image, &shotframe::StyleConfig::default())?;
//! std::fs::write("framed.png", shotframe::encode_png(&out)?).expect("write output");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod foundation;

/// Per-render style configuration (JSON-deserializable).
pub mod config;
/// Image decode and PNG encode at the pipeline boundaries.
pub mod encode;
/// Compositing backend.
pub mod render;

mod trim;

pub use crate::config::{AspectRatio, Background, ColorDef, FrameStyle, StyleConfig};
pub use crate::encode::{decode_image, encode_png};
pub use crate::foundation::core::{Canvas, RasterImage, Rgba8Premul};
pub use crate::foundation::error::{ShotframeError, ShotframeResult};
pub use crate::render::cpu::{Compositor, CompositorOpts, render};
pub use crate::trim::trim;
