//! Premultiplied-RGBA8 pixel kernels for the compositor stages.
//!
//! Everything here operates on plain byte slices (4 bytes per pixel,
//! premultiplied alpha) so the stages stay testable without a rasterizer.

use crate::config::ColorDef;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{ShotframeError, ShotframeResult};
use crate::foundation::math::{mul_div255_u8, noise_gray};
use crate::render::geometry::gradient_endpoints;

/// Side length of the synthesized square noise tile.
pub(crate) const NOISE_TILE: u32 = 512;

pub(crate) fn fill_solid(dst: &mut [u8], color: Rgba8Premul) {
    for px in dst.chunks_exact_mut(4) {
        px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
    }
}

/// Fill `dst` with a linear gradient along the `angle` segment (0 = up,
/// clockwise). Colors interpolate in straight-alpha space and are
/// premultiplied per pixel, matching how a 2D canvas ramps its stops.
pub(crate) fn fill_linear_gradient(
    dst: &mut [u8],
    width: u32,
    height: u32,
    start: ColorDef,
    end: ColorDef,
    angle_deg: f64,
) {
    let (p0, p1) = gradient_endpoints(f64::from(width), f64::from(height), angle_deg);
    let dir_x = p1.x - p0.x;
    let dir_y = p1.y - p0.y;
    let len_sq = dir_x * dir_x + dir_y * dir_y;

    // Zero-length segment degenerates to the start color (matches a gradient
    // whose two stops coincide).
    if len_sq <= f64::EPSILON {
        fill_solid(dst, start.to_rgba8_premul());
        return;
    }

    let s = start.to_straight_rgba8().map(f64::from);
    let e = end.to_straight_rgba8().map(f64::from);

    for y in 0..height {
        for x in 0..width {
            let px = f64::from(x) + 0.5;
            let py = f64::from(y) + 0.5;
            let t = (((px - p0.x) * dir_x + (py - p0.y) * dir_y) / len_sq).clamp(0.0, 1.0);

            let lerp = |i: usize| -> u8 { (s[i] + (e[i] - s[i]) * t).round().clamp(0.0, 255.0) as u8 };
            let c = Rgba8Premul::from_straight_rgba(lerp(0), lerp(1), lerp(2), lerp(3));

            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            dst[idx..idx + 4].copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }
}

/// Synthesize the square white-noise tile: one uniform gray value per pixel,
/// stored as single bytes (the overlay kernel expands to RGB on the fly).
pub(crate) fn noise_tile(seed: u64) -> Vec<u8> {
    let side = NOISE_TILE as usize;
    let mut tile = vec![0u8; side * side];
    for y in 0..NOISE_TILE {
        for x in 0..NOISE_TILE {
            tile[(y as usize) * side + (x as usize)] = noise_gray(seed, x, y);
        }
    }
    tile
}

/// Composite the repeating noise tile over `dst` with the overlay blend at
/// `opacity`. `scale` stretches the tile before repeating (coarser grain);
/// the pattern is sampled so it covers the whole canvas at any scale.
pub(crate) fn overlay_noise(
    dst: &mut [u8],
    width: u32,
    height: u32,
    tile: &[u8],
    scale: f64,
    opacity: f64,
) {
    let sa = opacity.clamp(0.0, 1.0) as f32;
    if sa <= 0.0 {
        return;
    }
    let scale = if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    };
    let side = NOISE_TILE as usize;
    let inv_sa = 1.0 - sa;

    for y in 0..height {
        let ty = ((f64::from(y) / scale) as usize) % side;
        for x in 0..width {
            let tx = ((f64::from(x) / scale) as usize) % side;
            let sc = f32::from(tile[ty * side + tx]) / 255.0;

            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let px = &mut dst[idx..idx + 4];

            // Porter-Duff over with the overlay blend applied to
            // unpremultiplied channels; src is opaque gray scaled by opacity.
            let da = px[3] as f32 / 255.0;
            let out_a = (sa + da * inv_sa).clamp(0.0, 1.0);
            for c in 0..3 {
                let dp = px[c] as f32 / 255.0;
                let dc = if da > 0.0 { (dp / da).clamp(0.0, 1.0) } else { 0.0 };
                let blended = overlay_blend(sc, dc);
                let out = (sc * sa * (1.0 - da) + dp * inv_sa + blended * sa * da).clamp(0.0, 1.0);
                px[c] = (out * 255.0).round() as u8;
            }
            px[3] = (out_a * 255.0).round() as u8;
        }
    }
}

/// Overlay blend on unpremultiplied channels: multiply in the shadows,
/// screen in the highlights.
pub(crate) fn overlay_blend(s: f32, d: f32) -> f32 {
    if d <= 0.5 {
        2.0 * s * d
    } else {
        1.0 - 2.0 * (1.0 - s) * (1.0 - d)
    }
}

/// Source-over `src` onto `dst`, both premultiplied, with a global opacity.
pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> ShotframeResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ShotframeError::surface(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    let op = ((opacity.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u16;
    if op == 0 {
        return Ok(());
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = mul_div255_u8(u16::from(s[3]), op);
        if sa == 0 {
            continue;
        }
        let inv = 255u16 - u16::from(sa);

        d[3] = add_sat_u8(sa, mul_div255_u8(u16::from(d[3]), inv));
        for c in 0..3 {
            let sc = mul_div255_u8(u16::from(s[c]), op);
            let dc = mul_div255_u8(u16::from(d[c]), inv);
            d[c] = add_sat_u8(sc, dc);
        }
    }
    Ok(())
}

/// Multiply `layer` by the alpha coverage of `mask` (the clip realization:
/// rounded-rect coverage is rasterized once and applied here).
pub(crate) fn mask_alpha_in_place(layer: &mut [u8], mask: &[u8]) -> ShotframeResult<()> {
    if layer.len() != mask.len() || !layer.len().is_multiple_of(4) {
        return Err(ShotframeError::surface(
            "mask_alpha_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (l, m) in layer.chunks_exact_mut(4).zip(mask.chunks_exact(4)) {
        let w = u16::from(m[3]);
        l[0] = mul_div255_u8(u16::from(l[0]), w);
        l[1] = mul_div255_u8(u16::from(l[1]), w);
        l[2] = mul_div255_u8(u16::from(l[2]), w);
        l[3] = mul_div255_u8(u16::from(l[3]), w);
    }
    Ok(())
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 || a == 255 {
            continue;
        }
        px[0] = ((u32::from(px[0]) * 255 + a / 2) / a).min(255) as u8;
        px[1] = ((u32::from(px[1]) * 255 + a / 2) / a).min(255) as u8;
        px[2] = ((u32::from(px[2]) * 255 + a / 2) / a).min(255) as u8;
    }
}

/// Normalized gaussian weights in Q16 fixed point (sum is exactly 1 << 16).
pub(crate) fn gaussian_kernel_q16(radius: u32, sigma: f64) -> ShotframeResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(ShotframeError::surface("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let mut weights_f = Vec::<f64>::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    let denom = 2.0 * sigma * sigma;
    for i in -r..=r {
        let x = i as f64;
        let w = (-x * x / denom).exp();
        weights_f.push(w);
        sum += w;
    }
    if sum <= 0.0 {
        return Err(ShotframeError::surface("gaussian kernel sum is zero"));
    }

    let mut weights = Vec::<u32>::with_capacity(weights_f.len());
    let mut acc: i64 = 0;
    for &wf in &weights_f {
        let q = ((wf / sum) * 65536.0).round() as i64;
        let q = q.clamp(0, 65536);
        weights.push(q as u32);
        acc += q;
    }
    // Absorb the rounding residue in the center tap.
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        let mid_val = i64::from(weights[mid]);
        weights[mid] = (mid_val + delta).clamp(0, 65536) as u32;
    }

    Ok(weights)
}

/// Separable gaussian blur over premultiplied RGBA8, clamping at the edges.
pub(crate) fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    tmp: &mut [u8],
    width: u32,
    height: u32,
    kernel_q16: &[u32],
) {
    if kernel_q16.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    horizontal_blur_q16(src, tmp, width, height, kernel_q16);
    vertical_blur_q16(tmp, dst, width, height, kernel_q16);
}

fn horizontal_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    for y in 0..height as i32 {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dx = ki as i32 - radius;
                let sx = (x + dx).clamp(0, w - 1);
                let idx = ((y * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn vertical_blur_q16(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32]) {
    let radius = (k.len() / 2) as i32;
    let w = width as i32;
    let h = height as i32;
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let dy = ki as i32 - radius;
                let sy = (y + dy).clamp(0, h - 1);
                let idx = ((sy * w + x) as usize) * 4;
                for c in 0..4 {
                    acc[c] += (kw as u64) * (src[idx + c] as u64);
                }
            }
            let out_idx = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out_idx + c] = q16_to_u8(acc[c]);
            }
        }
    }
}

fn q16_to_u8(acc: u64) -> u8 {
    let v = (acc + 32768) >> 16;
    (v.min(255)) as u8
}

fn add_sat_u8(a: u8, b: u8) -> u8 {
    a.saturating_add(b)
}
