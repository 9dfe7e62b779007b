//! Pure placement geometry: canvas sizing, image fitting, and the shared
//! rounded-rect path used by every stage that traces the frame outline.

use crate::config::{AspectRatio, StyleConfig};
use crate::foundation::core::Canvas;
use kurbo::{Point, Rect, Shape};

/// The long edge of every composite, in pixels.
pub(crate) const MAX_DIMENSION: f64 = 2400.0;

/// Ratio actually used for canvas sizing: nominal, or the source image's own.
pub(crate) fn effective_ratio(aspect: AspectRatio, img_w: u32, img_h: u32) -> f64 {
    match aspect.nominal() {
        Some(r) => r,
        None => f64::from(img_w) / f64::from(img_h.max(1)),
    }
}

/// Canvas dimensions for `ratio`: the longer edge is pinned to
/// [`MAX_DIMENSION`] so narrow ratios never blow up the short edge.
pub(crate) fn canvas_size(ratio: f64) -> Canvas {
    let ratio = if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        1.0
    };
    let (w, h) = if ratio >= 1.0 {
        (MAX_DIMENSION, MAX_DIMENSION / ratio)
    } else {
        (MAX_DIMENSION * ratio, MAX_DIMENSION)
    };
    Canvas {
        width: (w.round() as u32).max(1),
        height: (h.round() as u32).max(1),
    }
}

/// All derived pixel measurements for one render, shared across stages.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameLayout {
    pub(crate) min_dim: f64,
    /// Fitted, centered image rectangle in canvas space.
    pub(crate) draw: Rect,
    /// Corner radius before the per-rect capsule clamp.
    pub(crate) radius: f64,
    pub(crate) shadow_blur: f64,
    pub(crate) shadow_offset_y: f64,
    pub(crate) stack_offset: f64,
    pub(crate) glass_stroke_width: f64,
}

/// Fit the source image into the padded canvas, preserving its own ratio.
pub(crate) fn compute_layout(
    config: &StyleConfig,
    canvas: Canvas,
    img_w: u32,
    img_h: u32,
) -> FrameLayout {
    let width = f64::from(canvas.width);
    let height = f64::from(canvas.height);
    let min_dim = width.min(height);

    // Padding budget is 40% of the min dimension at the 100% slider stop.
    let padding_px = (config.padding.max(0.0) / 100.0) * (min_dim * 0.4);
    let available_w = (width - padding_px * 2.0).max(0.0);
    let available_h = (height - padding_px * 2.0).max(0.0);

    let img_ratio = f64::from(img_w) / f64::from(img_h.max(1));
    let container_ratio = if available_h > 0.0 {
        available_w / available_h
    } else {
        f64::INFINITY
    };

    let (draw_w, draw_h) = if img_ratio > container_ratio {
        (available_w, available_w / img_ratio)
    } else {
        (available_h * img_ratio, available_h)
    };

    let x = (width - draw_w) / 2.0;
    let y = (height - draw_h) / 2.0;

    let shadow_amount = config.shadow.max(0.0) / 100.0;

    FrameLayout {
        min_dim,
        draw: Rect::new(x, y, x + draw_w, y + draw_h),
        radius: (config.border_radius.max(0.0) / 100.0) * (min_dim * 0.08),
        shadow_blur: shadow_amount * (min_dim * 0.15),
        shadow_offset_y: shadow_amount * (min_dim * 0.06),
        stack_offset: min_dim * 0.02,
        glass_stroke_width: min_dim * 0.002,
    }
}

/// Corner radius actually usable for a `w x h` rect: at most half the shorter
/// side, so an oversized request degrades to a capsule instead of a
/// self-intersecting path.
pub(crate) fn clamp_radius(w: f64, h: f64, r: f64) -> f64 {
    r.clamp(0.0, (w / 2.0).min(h / 2.0).max(0.0))
}

/// The one rounded-rect path every stage shares. Shadow silhouette, clip
/// mask, stack cards, and glass stroke all trace this exact geometry; any
/// divergence shows up as visible misalignment at the corners.
pub(crate) fn rounded_rect_path(x: f64, y: f64, w: f64, h: f64, r: f64) -> kurbo::BezPath {
    let r = clamp_radius(w, h, r);
    let rr = kurbo::RoundedRect::new(x, y, x + w.max(0.0), y + h.max(0.0), r);
    let mut path = kurbo::BezPath::new();
    for el in rr.path_elements(0.1) {
        path.push(el);
    }
    path
}

/// Endpoints of the linear gradient for `angle` degrees (0 = up, clockwise).
///
/// The segment passes through the canvas center with length equal to the
/// bounding-box projection onto the gradient direction, so the ramp spans the
/// whole canvas at any angle without clipping the corners.
pub(crate) fn gradient_endpoints(width: f64, height: f64, angle_deg: f64) -> (Point, Point) {
    let theta = (angle_deg - 90.0).to_radians();
    let (sin, cos) = theta.sin_cos();
    let length = (width * cos).abs() + (height * sin).abs();

    let cx = width / 2.0;
    let cy = height / 2.0;
    let half = length / 2.0;
    (
        Point::new(cx - cos * half, cy - sin * half),
        Point::new(cx + cos * half, cy + sin * half),
    )
}
