use shotframe::{
    AspectRatio, Background, ColorDef, Compositor, CompositorOpts, FrameStyle, RasterImage,
    ShotframeError, StyleConfig, render, trim,
};

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn digest_u64(bytes: &[u8]) -> u64 {
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for chunk in bytes.chunks(8) {
        let mut v = 0u64;
        for (i, &b) in chunk.iter().enumerate() {
            v |= (b as u64) << (i * 8);
        }
        state = mix64(state ^ v);
    }
    state
}

fn solid_image(w: u32, h: u32, px: [u8; 4]) -> RasterImage {
    let mut data = vec![0u8; (w as usize) * (h as usize) * 4];
    for chunk in data.chunks_exact_mut(4) {
        chunk.copy_from_slice(&px);
    }
    RasterImage {
        width: w,
        height: h,
        data,
    }
}

fn px(img: &RasterImage, x: u32, y: u32) -> [u8; 4] {
    let idx = ((y as usize) * (img.width as usize) + (x as usize)) * 4;
    [
        img.data[idx],
        img.data[idx + 1],
        img.data[idx + 2],
        img.data[idx + 3],
    ]
}

fn flat_config(background: Background) -> StyleConfig {
    StyleConfig {
        aspect_ratio: AspectRatio::Square,
        padding: 0.0,
        border_radius: 0.0,
        shadow: 0.0,
        frame_style: FrameStyle::Default,
        background,
        noise_opacity: 0.0,
        noise_roughness: 0.4,
    }
}

fn black() -> Background {
    Background::Solid {
        color: ColorDef::rgba(0.0, 0.0, 0.0, 1.0),
    }
}

#[test]
fn long_edge_is_2400_for_every_ratio() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let img = solid_image(100, 80, [50, 100, 150, 255]);
    for (aspect, nominal) in [
        (AspectRatio::Wide16x9, 16.0 / 9.0),
        (AspectRatio::Tall9x16, 9.0 / 16.0),
        (AspectRatio::Classic4x3, 4.0 / 3.0),
        (AspectRatio::Classic3x4, 3.0 / 4.0),
        (AspectRatio::Square, 1.0),
        (AspectRatio::Auto, 100.0 / 80.0),
    ] {
        let config = StyleConfig {
            aspect_ratio: aspect,
            noise_opacity: 0.0,
            ..StyleConfig::default()
        };
        let out = render(&img, &config).unwrap();
        assert_eq!(out.width.max(out.height), 2400, "{aspect:?}");
        let actual = f64::from(out.width) / f64::from(out.height);
        assert!(
            (actual - nominal).abs() < 1e-3,
            "{aspect:?}: ratio {actual} vs {nominal}"
        );
    }
}

#[test]
fn flat_square_render_places_the_image_exactly() {
    // 1200x800 image on a square canvas with no padding: the fit is
    // width-constrained, so the draw rect is 2400x1600 centered at y=400.
    let img = solid_image(1200, 800, [255, 0, 0, 255]);
    let out = render(&img, &flat_config(black())).unwrap();
    assert_eq!((out.width, out.height), (2400, 2400));

    // Inside the image band: the source red (resampling may wobble a hair).
    for (x, y) in [(1200, 1200), (10, 410)] {
        let [r, g, b, a] = px(&out, x, y);
        assert!(r >= 250 && g <= 5 && b <= 5 && a == 255, "({x},{y}): {r},{g},{b},{a}");
    }
    // Above and below the band: the solid background.
    assert_eq!(px(&out, 1200, 100), [0, 0, 0, 255]);
    assert_eq!(px(&out, 1200, 2300), [0, 0, 0, 255]);
    assert_eq!(px(&out, 0, 0), [0, 0, 0, 255]);
    assert_eq!(px(&out, 2399, 2399), [0, 0, 0, 255]);
}

#[test]
fn output_is_fully_opaque_over_an_opaque_background() {
    let img = solid_image(640, 480, [12, 200, 64, 255]);
    let config = StyleConfig {
        noise_opacity: 0.0,
        ..StyleConfig::default()
    };
    let out = render(&img, &config).unwrap();
    assert!(out.data.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn gradient_background_ramps_along_the_requested_angle() {
    // 180 degrees points straight down: start color at the top edge.
    let img = solid_image(200, 200, [0, 0, 255, 255]);
    let config = StyleConfig {
        aspect_ratio: AspectRatio::Square,
        padding: 50.0,
        noise_opacity: 0.0,
        background: Background::Gradient {
            start: ColorDef::rgba(1.0, 1.0, 1.0, 1.0),
            end: ColorDef::rgba(0.0, 0.0, 0.0, 1.0),
            angle: 180.0,
        },
        ..StyleConfig::default()
    };
    let out = render(&img, &config).unwrap();
    let top = px(&out, 10, 10);
    let bottom = px(&out, 10, 2390);
    assert!(top[0] > 240, "top edge should be near the start color");
    assert!(bottom[0] < 15, "bottom edge should be near the end color");
}

#[test]
fn stack_cards_step_down_in_brightness_below_the_frame() {
    // Square canvas, 20% padding: draw rect spans y 192..2208, the stack
    // offset is 48 px. Below the image bottom the near card (alpha 0.7 over
    // 0.4) covers the first 48 px strip, the far card (0.4) the next one, and
    // the bare background follows.
    let img = solid_image(800, 800, [255, 0, 0, 255]);
    let config = StyleConfig {
        aspect_ratio: AspectRatio::Square,
        padding: 20.0,
        border_radius: 0.0,
        shadow: 0.0,
        frame_style: FrameStyle::Stack,
        background: black(),
        noise_opacity: 0.0,
        noise_roughness: 0.4,
    };
    let out = render(&img, &config).unwrap();
    assert_eq!((out.width, out.height), (2400, 2400));

    let near_card = px(&out, 1200, 2208 + 24)[1];
    let far_card = px(&out, 1200, 2208 + 48 + 24)[1];
    let background = px(&out, 1200, 2350)[1];
    assert!(
        near_card > far_card,
        "near card {near_card} vs far card {far_card}"
    );
    assert!(
        far_card > background,
        "far card {far_card} vs background {background}"
    );
    assert_eq!(background, 0);
}

#[test]
fn shadow_darkens_the_gap_below_a_padded_frame() {
    let img = solid_image(800, 800, [255, 255, 255, 255]);
    let white_bg = Background::Solid {
        color: ColorDef::rgba(1.0, 1.0, 1.0, 1.0),
    };
    let base = StyleConfig {
        aspect_ratio: AspectRatio::Square,
        padding: 20.0,
        border_radius: 0.0,
        frame_style: FrameStyle::Default,
        background: white_bg,
        noise_opacity: 0.0,
        noise_roughness: 0.4,
        shadow: 0.0,
    };
    let without = render(&img, &base).unwrap();
    let with = render(
        &img,
        &StyleConfig {
            shadow: 2.0,
            ..base
        },
    )
    .unwrap();

    // Just below the image bottom edge (y=2208) the offset blurred
    // silhouette shows; without a shadow that spot is the white background.
    let probe = |out: &RasterImage| px(out, 1200, 2212)[0];
    assert_eq!(probe(&without), 255);
    assert!(probe(&with) < 250, "shadow should darken below the frame");
}

#[test]
fn rounded_corners_expose_the_background() {
    let img = solid_image(800, 800, [255, 0, 0, 255]);
    let config = StyleConfig {
        border_radius: 100.0,
        ..flat_config(black())
    };
    let out = render(&img, &config).unwrap();
    // With no padding the draw rect is the whole canvas; a full-strength
    // radius (8% of 2400 = 192 px) leaves the literal corner uncovered.
    assert_eq!(px(&out, 2, 2), [0, 0, 0, 255]);
    assert_eq!(px(&out, 1200, 1200), [255, 0, 0, 255]);
}

#[test]
fn glass_style_brightens_the_top_of_the_frame() {
    let img = solid_image(800, 800, [100, 100, 100, 255]);
    let base = flat_config(black());
    let plain = render(&img, &base).unwrap();
    let glass = render(
        &img,
        &StyleConfig {
            frame_style: FrameStyle::Glass,
            ..base
        },
    )
    .unwrap();

    // The sheen is strongest near the top edge and gone at the midline.
    let top_plain = px(&plain, 1200, 60)[0];
    let top_glass = px(&glass, 1200, 60)[0];
    assert!(top_glass > top_plain);
    let mid_plain = px(&plain, 600, 1200)[0];
    let mid_glass = px(&glass, 600, 1200)[0];
    assert!(mid_glass.abs_diff(mid_plain) <= 2);
}

#[test]
fn seeded_renders_are_bit_identical() {
    let img = solid_image(320, 200, [30, 60, 90, 255]);
    let config = StyleConfig::default();

    let run = |seed: u64| {
        let mut c = Compositor::new(CompositorOpts {
            noise_seed: Some(seed),
        });
        digest_u64(&c.render(&img, &config).unwrap().data)
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}

#[test]
fn unseeded_grain_differs_between_renders() {
    let img = solid_image(320, 200, [30, 60, 90, 255]);
    let config = StyleConfig::default();
    let a = render(&img, &config).unwrap();
    let b = render(&img, &config).unwrap();
    assert_ne!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn noise_free_renders_are_deterministic_without_a_seed() {
    let img = solid_image(320, 200, [30, 60, 90, 255]);
    let config = StyleConfig {
        noise_opacity: 0.0,
        ..StyleConfig::default()
    };
    let a = render(&img, &config).unwrap();
    let b = render(&img, &config).unwrap();
    assert_eq!(digest_u64(&a.data), digest_u64(&b.data));
}

#[test]
fn empty_image_is_rejected() {
    let img = RasterImage {
        width: 0,
        height: 0,
        data: Vec::new(),
    };
    let err = render(&img, &StyleConfig::default()).unwrap_err();
    assert!(matches!(err, ShotframeError::InvalidInput(_)));
}

#[test]
fn trim_then_render_sizes_the_canvas_from_content_bounds() {
    // 100x100 upload whose content is a 40x20 block: after trimming, the
    // auto canvas follows the 2:1 content ratio.
    let mut img = solid_image(100, 100, [0, 0, 0, 0]);
    for y in 40..60u32 {
        for x in 30..70u32 {
            let idx = ((y as usize) * 100 + (x as usize)) * 4;
            img.data[idx..idx + 4].copy_from_slice(&[255, 128, 0, 255]);
        }
    }
    let trimmed = trim(&img);
    assert_eq!((trimmed.width, trimmed.height), (40, 20));

    let config = StyleConfig {
        aspect_ratio: AspectRatio::Auto,
        noise_opacity: 0.0,
        ..StyleConfig::default()
    };
    let out = render(&trimmed, &config).unwrap();
    assert_eq!((out.width, out.height), (2400, 1200));
}

#[test]
fn full_pipeline_round_trips_through_png() {
    let img = solid_image(64, 48, [200, 30, 30, 255]);
    let out = render(
        &img,
        &StyleConfig {
            noise_opacity: 0.0,
            ..StyleConfig::default()
        },
    )
    .unwrap();
    let png = shotframe::encode_png(&out).unwrap();
    let back = shotframe::decode_image(&png).unwrap();
    assert_eq!(back, out);
}
