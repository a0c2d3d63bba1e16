//! Bitmap post-processing for Pixelshot.
//!
//! This crate holds the pixel-level engines behind screenshot editing:
//! box blur, Scale2x/Scale3x upscaling, auto-crop detection, and the
//! composite operations built from them (drop shadows, canvas padding,
//! resizing, colour matrices and effect chains).
//!
//! All engines work on a [`PixelBuffer`], an owned grid of 24 or 32 bit
//! pixels. Data-parallel work runs on the bounded worker pool from
//! [`pixelshot_core::ThreadPool`].
//!
//! # Blurring
//!
//! ```
//! use pixelshot_gfx::{Color, PixelBuffer, PixelFormat, box_blur};
//!
//! let mut buffer = PixelBuffer::filled(32, 32, PixelFormat::Argb32, Color::WHITE);
//! buffer.set_color_at(16, 16, Color::BLACK);
//! box_blur(&mut buffer, 5)?;
//! assert_ne!(buffer.color_at(15, 16), Color::WHITE);
//! # Ok::<(), pixelshot_gfx::GfxError>(())
//! ```
//!
//! # Upscaling pixel art
//!
//! ```
//! use pixelshot_gfx::{Color, PixelBuffer, PixelFormat, scale2x};
//!
//! let icon = PixelBuffer::filled(16, 16, PixelFormat::Argb32, Color::RED);
//! let doubled = scale2x(&icon)?;
//! assert_eq!(doubled.dimensions(), (32, 32));
//! # Ok::<(), pixelshot_gfx::GfxError>(())
//! ```
//!
//! # Auto-crop
//!
//! ```
//! use pixelshot_gfx::{Color, PixelBuffer, PixelFormat, Rect, crop, find_auto_crop_rectangle};
//!
//! let mut capture = PixelBuffer::filled(10, 10, PixelFormat::Rgb24, Color::WHITE);
//! capture.set_color_at(3, 4, Color::RED);
//!
//! let rect = find_auto_crop_rectangle(&capture, 0);
//! assert_eq!(rect, Rect::new(3, 4, 1, 1));
//! let cropped = crop(&capture, rect).unwrap();
//! assert_eq!(cropped.dimensions(), (1, 1));
//! ```
//!
//! # Drop shadows
//!
//! ```
//! use pixelshot_gfx::{Color, PixelBuffer, PixelFormat, ShadowOptions, Transform2D, create_shadow};
//!
//! let image = PixelBuffer::filled(40, 30, PixelFormat::Argb32, Color::BLUE);
//! let mut transform = Transform2D::IDENTITY;
//! let shadowed = create_shadow(&image, &ShadowOptions::default(), &mut transform)?;
//! assert_eq!(shadowed.dimensions(), (54, 44));
//! # Ok::<(), pixelshot_gfx::GfxError>(())
//! ```

pub mod autocrop;
pub mod blur;
pub mod color_matrix;
pub mod composite;
pub mod decode;
pub mod effects;
mod error;
pub mod pixel_buffer;
pub mod resample;
pub mod scale;
pub mod transform;
pub mod types;

pub use autocrop::{
    count_colors, count_colors_with, crop, find_auto_crop_rectangle, find_auto_crop_rectangle_for,
    find_auto_crop_rectangle_with,
};
pub use blur::{box_blur, box_blur_with};
pub use color_matrix::{
    ColorMatrix, apply_color_matrix, apply_color_matrix_in_place, apply_color_matrix_in_place_with,
    apply_color_matrix_with,
};
pub use composite::{
    DEFAULT_SCREEN_DPI, ResizeOptions, ShadowOptions, create_intersect_rectangle, create_monochrome,
    create_shadow, create_thumbnail, draw_image, resize, resize_canvas, scale_by_percent,
    scale_icon_for_displaying,
};
pub use decode::{DecodeFn, DecoderRegistry, decode_with_image_crate};
pub use effects::{Effect, MonochromeEffect, ResizeEffect, apply_effect, apply_effects};
pub use error::{GfxError, GfxResult};
pub use pixel_buffer::{ClipView, PixelBuffer, PixelFormat};
pub use resample::{ResizeFilter, resample};
pub use scale::{scale2x, scale2x_with, scale3x, scale3x_with};
pub use transform::Transform2D;
pub use types::{Color, Point, Rect, Size};

static_assertions::assert_impl_all!(DecoderRegistry: Send, Sync);
static_assertions::assert_impl_all!(MonochromeEffect: Effect);
static_assertions::assert_impl_all!(ResizeEffect: Effect);
