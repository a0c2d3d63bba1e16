//! Integration tests for the post-processing pipeline.
//!
//! These exercise the public API the way a screenshot editor would: decode,
//! detect content, crop, decorate and scale.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use pixelshot_core::{ThreadPool, ThreadPoolConfig};
use pixelshot_gfx::{
    Color, ColorMatrix, DecoderRegistry, Effect, MonochromeEffect, PixelBuffer, PixelFormat, Point, Rect,
    ResizeEffect, ResizeFilter, ResizeOptions, ShadowOptions, Transform2D, apply_color_matrix_in_place_with,
    apply_effects, box_blur, box_blur_with, count_colors_with, create_shadow, crop, find_auto_crop_rectangle,
    find_auto_crop_rectangle_with, resize, resize_canvas, scale2x, scale2x_with, scale3x_with,
    scale_icon_for_displaying,
};

fn checkerboard(width: u32, height: u32, format: PixelFormat) -> PixelBuffer {
    let mut buffer = PixelBuffer::new(width, height, format);
    for y in 0..height {
        for x in 0..width {
            let color = if (x + y) % 2 == 0 { Color::BLACK } else { Color::WHITE };
            buffer.set_color_at(x, y, color);
        }
    }
    buffer
}

#[test]
fn test_blur_noop_for_small_ranges() {
    let original = checkerboard(12, 8, PixelFormat::Argb32);
    let mut buffer = original.clone();
    box_blur(&mut buffer, 0).unwrap();
    box_blur(&mut buffer, 1).unwrap();
    assert_eq!(buffer, original);
}

#[test]
fn test_blur_is_deterministic_across_pool_sizes() {
    let single = ThreadPool::new(ThreadPoolConfig::with_threads(1)).unwrap();
    let many = ThreadPool::new(ThreadPoolConfig::with_threads(4)).unwrap();

    let mut a = checkerboard(33, 17, PixelFormat::Rgb24);
    let mut b = a.clone();
    box_blur_with(&single, &mut a, 5).unwrap();
    box_blur_with(&many, &mut b, 5).unwrap();
    assert_eq!(a, b);

    let x = scale3x_with(&single, &checkerboard(9, 5, PixelFormat::Argb32)).unwrap();
    let y = scale3x_with(&many, &checkerboard(9, 5, PixelFormat::Argb32)).unwrap();
    assert_eq!(x, y);

    let mut capture = PixelBuffer::filled(40, 30, PixelFormat::Rgb32, Color::WHITE);
    for (x, y) in [(5, 7), (31, 12), (17, 26)] {
        capture.set_color_at(x, y, Color::RED);
    }
    let expected = Rect::new(5, 7, 27, 20);
    assert_eq!(find_auto_crop_rectangle_with(&single, &capture, 0), expected);
    assert_eq!(find_auto_crop_rectangle_with(&many, &capture, 0), expected);
    assert_eq!(count_colors_with(&single, &capture, Color::RED, false), 3);
    assert_eq!(count_colors_with(&many, &capture, Color::RED, false), 3);

    let mut gray_a = checkerboard(11, 6, PixelFormat::Argb32);
    let mut gray_b = gray_a.clone();
    apply_color_matrix_in_place_with(&single, &mut gray_a, &ColorMatrix::grayscale());
    apply_color_matrix_in_place_with(&many, &mut gray_b, &ColorMatrix::grayscale());
    assert_eq!(gray_a, gray_b);
}

#[test]
fn test_blur_smooths_checkerboard() {
    let mut buffer = checkerboard(16, 16, PixelFormat::Rgb24);
    box_blur(&mut buffer, 3).unwrap();
    let centre = buffer.color_at(8, 8);
    assert!(centre.r > 60 && centre.r < 200, "{:?}", centre);
}

#[test]
fn test_scale2x_of_checkerboard_interior_is_nearest_neighbour() {
    // Away from the clamped border, B == H for every pixel
    let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
    let source = checkerboard(6, 6, PixelFormat::Argb32);
    let scaled = scale2x_with(&pool, &source).unwrap();
    for y in 2..10 {
        for x in 2..10 {
            assert_eq!(scaled.color_at(x, y), source.color_at(x / 2, y / 2));
        }
    }
}

#[test]
fn test_auto_crop_then_crop() {
    let mut capture = PixelBuffer::filled(64, 48, PixelFormat::Argb32, Color::WHITE);
    for y in 10..20 {
        for x in 30..50 {
            capture.set_color_at(x, y, Color::from_rgb(20, 40, 60));
        }
    }

    let rect = find_auto_crop_rectangle(&capture, 10);
    assert_eq!(rect, Rect::new(30, 10, 20, 10));

    let cropped = crop(&capture, rect).unwrap();
    assert_eq!(cropped.dimensions(), (20, 10));
    assert_eq!(find_auto_crop_rectangle(&cropped, 0), Rect::EMPTY);
}

#[test]
fn test_decode_and_process() {
    let mut image = RgbaImage::from_pixel(8, 8, Rgba([255, 255, 255, 255]));
    image.put_pixel(2, 5, Rgba([0, 0, 0, 255]));
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();

    let registry = DecoderRegistry::with_defaults();
    let buffer = registry.decode(&bytes, Some(".png")).unwrap();
    assert_eq!(buffer.format(), PixelFormat::Argb32);
    assert_eq!(find_auto_crop_rectangle(&buffer, 0), Rect::new(2, 5, 1, 1));
}

#[test]
fn test_shadow_and_padding_transforms_compose() {
    let image = PixelBuffer::filled(20, 10, PixelFormat::Argb32, Color::GREEN);
    let mut transform = Transform2D::IDENTITY;

    let padded = resize_canvas(&image, Color::WHITE, 4, 4, 2, 2, &mut transform).unwrap();
    let options = ShadowOptions::default().with_shadow_size(3).with_offset(Point::ZERO);
    let shadowed = create_shadow(&padded, &options, &mut transform).unwrap();

    assert_eq!(shadowed.dimensions(), (34, 20));
    // Padding (4, 2) followed by the shadow shift (2, 2)
    assert_eq!(transform.translation(), (6.0, 4.0));
    let (x, y) = transform.transform_point(0.0, 0.0);
    assert_eq!(shadowed.color_at(x as u32, y as u32), Color::GREEN);
}

#[test]
fn test_resize_matches_requested_dimensions() {
    let source = checkerboard(37, 23, PixelFormat::Argb32);
    for (w, h) in [(1, 1), (74, 46), (10, 90), (36, 22), (100, 3)] {
        let mut transform = Transform2D::IDENTITY;
        let resized = resize(&source, &ResizeOptions::new(w, h), Some(&mut transform)).unwrap();
        assert_eq!(resized.dimensions(), (w as u32, h as u32));
    }

    for (w, h) in [(50, 50), (20, 80), (200, 10)] {
        let options = ResizeOptions::new(w, h)
            .with_aspect_ratio(true)
            .with_canvas(Color::TRANSPARENT)
            .with_filter(ResizeFilter::Triangle);
        let resized = resize(&source, &options, None).unwrap();
        assert_eq!(resized.dimensions(), (w as u32, h as u32));
    }
}

#[test]
fn test_effect_chain() {
    let source = PixelBuffer::filled(30, 20, PixelFormat::Argb32, Color::from_rgb(40, 40, 40));
    let mono = MonochromeEffect::new(100);
    let shrink = ResizeEffect::new(15, 0, true);
    let effects: [&dyn Effect; 2] = [&mono, &shrink];

    let mut transform = Transform2D::IDENTITY;
    let result = apply_effects(&source, &effects, &mut transform).unwrap();
    assert_eq!(result.dimensions(), (15, 10));
    assert_eq!(result.color_at(7, 5), Color::BLACK);
    assert_eq!(transform.transform_point(30.0, 20.0), (15.0, 10.0));
}

#[test]
fn test_icon_scaling_paths() {
    let icon = checkerboard(16, 16, PixelFormat::Argb32);
    let doubled = scale_icon_for_displaying(&icon, 192.0, 16).unwrap();
    assert_eq!(doubled, scale2x(&icon).unwrap());

    let quad = scale_icon_for_displaying(&icon, 384.0, 16).unwrap();
    assert_eq!(quad, scale2x(&scale2x(&icon).unwrap()).unwrap());
}

#[test]
fn test_blur_logs_under_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let mut buffer = checkerboard(8, 8, PixelFormat::Argb32);
        box_blur(&mut buffer, 3).unwrap();
    });
}
