//! CPU compositor: an ordered pipeline of drawing stages over one canvas.
//!
//! Stage order is load-bearing: background, grain, stack backdrop, shadow,
//! masked image draw, glass overlay. The shadow goes down before the image so
//! the image occludes it correctly while the blur still bleeds past the
//! edges. Rounded-rect coverage is rasterized with `vello_cpu`; everything
//! else is premul byte kernels from [`paint`].

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Background, FrameStyle, StyleConfig};
use crate::foundation::core::{Canvas, RasterImage};
use crate::foundation::error::{ShotframeError, ShotframeResult};
use crate::foundation::math::{Fnv1a64, mul_div255_u8};
use crate::render::geometry::{self, FrameLayout};
use crate::render::paint;

/// Options for a [`Compositor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositorOpts {
    /// Fixed seed for the grain stage. `None` (the default) draws a fresh
    /// seed per render, so repeated exports get visually similar but
    /// pixel-different grain; `Some` makes output fully reproducible.
    pub noise_seed: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct BlurKernelKey {
    radius_px: u32,
    sigma_bits: u64,
}

/// Offline compositor. Owns its scratch state (render context, cached noise
/// tiles and blur kernels), so concurrent renders each construct their own.
pub struct Compositor {
    opts: CompositorOpts,
    ctx: Option<vello_cpu::RenderContext>,
    noise_tiles: HashMap<u64, Arc<Vec<u8>>>,
    blur_kernels: HashMap<BlurKernelKey, Arc<Vec<u32>>>,
}

impl Compositor {
    pub fn new(opts: CompositorOpts) -> Self {
        Self {
            opts,
            ctx: None,
            noise_tiles: HashMap::new(),
            blur_kernels: HashMap::new(),
        }
    }

    /// Compose `image` per `config` into a canvas whose long edge is 2400 px.
    ///
    /// Fails with `InvalidInput` for a degenerate image or non-finite config
    /// numerics and never returns a partially composited result.
    #[tracing::instrument(skip_all)]
    pub fn render(
        &mut self,
        image: &RasterImage,
        config: &StyleConfig,
    ) -> ShotframeResult<RasterImage> {
        if image.is_degenerate() {
            return Err(ShotframeError::invalid_input(
                "source image is empty or its buffer does not match its dimensions",
            ));
        }
        config
            .ensure_finite()
            .map_err(ShotframeError::invalid_input)?;

        let ratio = geometry::effective_ratio(config.aspect_ratio, image.width, image.height);
        let canvas = geometry::canvas_size(ratio);
        let width_u16: u16 = canvas
            .width
            .try_into()
            .map_err(|_| ShotframeError::surface("canvas width exceeds u16"))?;
        let height_u16: u16 = canvas
            .height
            .try_into()
            .map_err(|_| ShotframeError::surface("canvas height exceeds u16"))?;

        let layout = geometry::compute_layout(config, canvas, image.width, image.height);
        tracing::debug!(
            width = canvas.width,
            height = canvas.height,
            draw_w = layout.draw.width(),
            draw_h = layout.draw.height(),
            "composite layout resolved"
        );

        let npx = (canvas.width as usize) * (canvas.height as usize) * 4;
        let mut surface = vec![0u8; npx];

        self.paint_background(&mut surface, canvas, config);
        self.paint_noise(&mut surface, canvas, config);

        // Anything below a one-pixel draw rect has no visible frame; the
        // background-only composite is still a valid result.
        let has_draw_area = layout.draw.width() >= 1.0 && layout.draw.height() >= 1.0;
        if has_draw_area {
            if config.frame_style == FrameStyle::Stack {
                self.paint_stack_backdrop(&mut surface, width_u16, height_u16, &layout)?;
            }
            if config.shadow > 0.0 {
                self.paint_shadow(&mut surface, canvas, width_u16, height_u16, &layout)?;
            }
            let mask = self.frame_mask(width_u16, height_u16, &layout)?;
            self.paint_image(&mut surface, canvas, image, &layout, &mask)?;
            if config.frame_style == FrameStyle::Glass {
                self.paint_glass_overlay(
                    &mut surface,
                    canvas,
                    width_u16,
                    height_u16,
                    &layout,
                    &mask,
                )?;
            }
        }

        paint::unpremultiply_rgba8_in_place(&mut surface);
        Ok(RasterImage {
            width: canvas.width,
            height: canvas.height,
            data: surface,
        })
    }

    fn paint_background(&self, surface: &mut [u8], canvas: Canvas, config: &StyleConfig) {
        match config.background {
            Background::Solid { color } => paint::fill_solid(surface, color.to_rgba8_premul()),
            Background::Gradient { start, end, angle } => {
                paint::fill_linear_gradient(surface, canvas.width, canvas.height, start, end, angle)
            }
        }
    }

    fn paint_noise(&mut self, surface: &mut [u8], canvas: Canvas, config: &StyleConfig) {
        if config.noise_opacity <= 0.0 {
            return;
        }
        let tile = match self.opts.noise_seed {
            Some(seed) => self
                .noise_tiles
                .entry(seed)
                .or_insert_with(|| Arc::new(paint::noise_tile(seed)))
                .clone(),
            // Seedless grain is regenerated per render on purpose; caching
            // would pin one realization for the compositor's lifetime.
            None => Arc::new(paint::noise_tile(entropy_seed())),
        };
        let scale = 0.8 + config.noise_roughness.clamp(0.0, 1.0) * 1.2;
        paint::overlay_noise(
            surface,
            canvas.width,
            canvas.height,
            &tile,
            scale,
            config.noise_opacity,
        );
    }

    fn paint_stack_backdrop(
        &mut self,
        surface: &mut [u8],
        width_u16: u16,
        height_u16: u16,
        layout: &FrameLayout,
    ) -> ShotframeResult<()> {
        let d = layout.draw;
        let s = layout.stack_offset;
        // Outermost card first so the nearer card paints over it. Cards slide
        // down-right and narrow by twice the slide, keeping their height.
        for (steps, alpha) in [(2.0, 0.4f32), (1.0, 0.7f32)] {
            let card_w = d.width() - steps * 2.0 * s;
            if card_w <= 0.0 {
                continue;
            }
            let path = geometry::rounded_rect_path(
                d.x0 + steps * s,
                d.y0 + steps * s,
                card_w,
                d.height(),
                layout.radius,
            );
            let layer = self.fill_path_layer(width_u16, height_u16, &path, [255, 255, 255, 255])?;
            paint::over_in_place(surface, &layer, alpha)?;
        }
        Ok(())
    }

    fn paint_shadow(
        &mut self,
        surface: &mut [u8],
        canvas: Canvas,
        width_u16: u16,
        height_u16: u16,
        layout: &FrameLayout,
    ) -> ShotframeResult<()> {
        let d = layout.draw;
        // Silhouette is drawn pre-offset so blur and composite stay aligned.
        let path = geometry::rounded_rect_path(
            d.x0,
            d.y0 + layout.shadow_offset_y,
            d.width(),
            d.height(),
            layout.radius,
        );
        let silhouette = self.fill_path_layer(width_u16, height_u16, &path, [0, 0, 0, 102])?;

        let sigma = layout.shadow_blur / 2.0;
        if sigma <= 0.0 {
            return paint::over_in_place(surface, &silhouette, 1.0);
        }

        let radius = (sigma * 2.0).ceil() as u32;
        let kernel = self.blur_kernel(radius, sigma)?;
        let mut blurred = vec![0u8; silhouette.len()];
        let mut scratch = vec![0u8; silhouette.len()];
        paint::blur_rgba8_premul_q16(
            &silhouette,
            &mut blurred,
            &mut scratch,
            canvas.width,
            canvas.height,
            &kernel,
        );
        paint::over_in_place(surface, &blurred, 1.0)
    }

    /// Coverage mask of the frame outline, shared by the clipped image draw
    /// and the glass highlight so both honor the exact same path.
    fn frame_mask(
        &mut self,
        width_u16: u16,
        height_u16: u16,
        layout: &FrameLayout,
    ) -> ShotframeResult<Vec<u8>> {
        let d = layout.draw;
        let path =
            geometry::rounded_rect_path(d.x0, d.y0, d.width(), d.height(), layout.radius);
        self.fill_path_layer(width_u16, height_u16, &path, [255, 255, 255, 255])
    }

    fn paint_image(
        &mut self,
        surface: &mut [u8],
        canvas: Canvas,
        image: &RasterImage,
        layout: &FrameLayout,
        mask: &[u8],
    ) -> ShotframeResult<()> {
        let mut layer = place_scaled_image(image, canvas, layout.draw)?;
        paint::mask_alpha_in_place(&mut layer, mask)?;
        paint::over_in_place(surface, &layer, 1.0)
    }

    fn paint_glass_overlay(
        &mut self,
        surface: &mut [u8],
        canvas: Canvas,
        width_u16: u16,
        height_u16: u16,
        layout: &FrameLayout,
        mask: &[u8],
    ) -> ShotframeResult<()> {
        let d = layout.draw;
        let r = geometry::clamp_radius(d.width(), d.height(), layout.radius);

        // Border ring as outer minus inset coverage; an explicit stroke would
        // need path expansion the fill rasterizer already gives us for free.
        let inset = layout.glass_stroke_width.max(0.0);
        let inner_path = geometry::rounded_rect_path(
            d.x0 + inset,
            d.y0 + inset,
            d.width() - 2.0 * inset,
            d.height() - 2.0 * inset,
            (r - inset).max(0.0),
        );
        let inner = self.fill_path_layer(width_u16, height_u16, &inner_path, [255, 255, 255, 255])?;
        let mut ring = vec![0u8; surface.len()];
        for ((out_px, m), i) in ring
            .chunks_exact_mut(4)
            .zip(mask.chunks_exact(4))
            .zip(inner.chunks_exact(4))
        {
            let edge = m[3].saturating_sub(i[3]);
            // White at 40%, premultiplied: every channel equals the alpha.
            let a = mul_div255_u8(u16::from(edge), 102);
            out_px.copy_from_slice(&[a, a, a, a]);
        }
        paint::over_in_place(surface, &ring, 1.0)?;

        // Specular sheen: vertical white ramp 40% -> 0% -> 10%, clipped to
        // the frame shape.
        let mut highlight = vec![0u8; surface.len()];
        fill_vertical_highlight(&mut highlight, canvas, d);
        paint::mask_alpha_in_place(&mut highlight, mask)?;
        paint::over_in_place(surface, &highlight, 1.0)
    }

    fn blur_kernel(&mut self, radius_px: u32, sigma: f64) -> ShotframeResult<Arc<Vec<u32>>> {
        let key = BlurKernelKey {
            radius_px,
            sigma_bits: sigma.to_bits(),
        };
        if let Some(k) = self.blur_kernels.get(&key) {
            return Ok(k.clone());
        }
        let k = Arc::new(paint::gaussian_kernel_q16(radius_px, sigma)?);
        self.blur_kernels.insert(key, k.clone());
        Ok(k)
    }

    fn with_ctx_mut<R>(
        &mut self,
        width: u16,
        height: u16,
        f: impl FnOnce(&mut Self, &mut vello_cpu::RenderContext) -> ShotframeResult<R>,
    ) -> ShotframeResult<R> {
        let mut ctx = match self.ctx.take() {
            None => vello_cpu::RenderContext::new(width, height),
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            Some(_) => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        let out = f(self, &mut ctx)?;
        self.ctx = Some(ctx);
        Ok(out)
    }

    /// Rasterize a single filled path into a fresh canvas-size premul layer.
    fn fill_path_layer(
        &mut self,
        width: u16,
        height: u16,
        path: &kurbo::BezPath,
        rgba: [u8; 4],
    ) -> ShotframeResult<Vec<u8>> {
        let cpu_path = bezpath_to_cpu(path);
        self.with_ctx_mut(width, height, |_, ctx| {
            ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                rgba[0], rgba[1], rgba[2], rgba[3],
            ));
            ctx.fill_path(&cpu_path);
            ctx.flush();
            let mut pixmap = vello_cpu::Pixmap::new(width, height);
            ctx.render_to_pixmap(&mut pixmap);
            Ok(pixmap.data_as_u8_slice().to_vec())
        })
    }
}

/// One-shot convenience over a throwaway [`Compositor`] with default options.
pub fn render(image: &RasterImage, config: &StyleConfig) -> ShotframeResult<RasterImage> {
    Compositor::new(CompositorOpts::default()).render(image, config)
}

/// Resize the source to the draw rect (triangle filter) and blit it,
/// premultiplied, into a canvas-size layer at the rect origin.
fn place_scaled_image(
    image: &RasterImage,
    canvas: Canvas,
    draw: kurbo::Rect,
) -> ShotframeResult<Vec<u8>> {
    let draw_w = draw.width().round().max(1.0) as u32;
    let draw_h = draw.height().round().max(1.0) as u32;

    let src = image::RgbaImage::from_raw(image.width, image.height, image.data.clone())
        .ok_or_else(|| ShotframeError::surface("source buffer does not match its dimensions"))?;
    let resized = image::imageops::resize(&src, draw_w, draw_h, image::imageops::FilterType::Triangle);
    let mut scaled = resized.into_raw();
    paint::premultiply_rgba8_in_place(&mut scaled);

    let mut layer = vec![0u8; (canvas.width as usize) * (canvas.height as usize) * 4];
    let ox = draw.x0.round() as i64;
    let oy = draw.y0.round() as i64;
    let canvas_w = canvas.width as i64;
    let canvas_h = canvas.height as i64;

    // Row-wise blit with clipping; negative padding can push the rect
    // partially off-canvas and that must degrade, not panic.
    let x_begin = ox.max(0);
    let x_end = (ox + draw_w as i64).min(canvas_w);
    if x_begin >= x_end {
        return Ok(layer);
    }
    let src_x = (x_begin - ox) as usize;
    let span = (x_end - x_begin) as usize;

    for row in 0..draw_h as i64 {
        let cy = oy + row;
        if cy < 0 || cy >= canvas_h {
            continue;
        }
        let src_start = ((row as usize) * (draw_w as usize) + src_x) * 4;
        let dst_start = ((cy as usize) * (canvas.width as usize) + x_begin as usize) * 4;
        layer[dst_start..dst_start + span * 4]
            .copy_from_slice(&scaled[src_start..src_start + span * 4]);
    }
    Ok(layer)
}

/// White sheen ramp over the draw rect: alpha 0.4 at the top edge, fading to
/// 0 at the midline and rising to 0.1 at the bottom edge.
fn fill_vertical_highlight(layer: &mut [u8], canvas: Canvas, draw: kurbo::Rect) {
    let y_begin = draw.y0.floor().max(0.0) as usize;
    let y_end = (draw.y1.ceil().min(f64::from(canvas.height))).max(0.0) as usize;
    let x_begin = draw.x0.floor().max(0.0) as usize;
    let x_end = (draw.x1.ceil().min(f64::from(canvas.width))).max(0.0) as usize;
    if draw.height() <= 0.0 || x_begin >= x_end {
        return;
    }

    for y in y_begin..y_end {
        let t = (((y as f64) + 0.5 - draw.y0) / draw.height()).clamp(0.0, 1.0);
        let alpha = if t < 0.5 {
            0.4 * (1.0 - t / 0.5)
        } else {
            0.1 * ((t - 0.5) / 0.5)
        };
        let a = (alpha * 255.0).round().clamp(0.0, 255.0) as u8;
        // Premul white: every channel equals the alpha byte.
        let px = [a, a, a, a];
        for x in x_begin..x_end {
            let idx = (y * (canvas.width as usize) + x) * 4;
            layer[idx..idx + 4].copy_from_slice(&px);
        }
    }
}

fn bezpath_to_cpu(path: &kurbo::BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(vello_cpu::kurbo::Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
            ),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                vello_cpu::kurbo::Point::new(p1.x, p1.y),
                vello_cpu::kurbo::Point::new(p2.x, p2.y),
                vello_cpu::kurbo::Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

static SEED_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Best-effort per-render entropy; a clock plus a process-local counter is
/// plenty for cosmetic grain.
fn entropy_seed() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let mut h = Fnv1a64::new_default();
    h.write_u64(now.as_secs());
    h.write_u64(u64::from(now.subsec_nanos()));
    h.write_u64(SEED_COUNTER.fetch_add(1, Ordering::Relaxed));
    h.finish()
}
