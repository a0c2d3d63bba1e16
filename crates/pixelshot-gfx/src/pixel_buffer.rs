//! Packed pixel storage with per-format channel addressing.
//!
//! [`PixelBuffer`] owns a row-major byte store and knows its [`PixelFormat`].
//! Engines never hard-code channel offsets; they ask the format for the
//! symbolic index of each channel.
//!
//! # Example
//!
//! ```
//! use pixelshot_gfx::{Color, PixelBuffer, PixelFormat, Rect};
//!
//! let mut buffer = PixelBuffer::filled(8, 8, PixelFormat::Argb32, Color::WHITE);
//! buffer.set_color_at(2, 3, Color::RED);
//! assert_eq!(buffer.color_at(2, 3), Color::RED);
//!
//! {
//!     // Restrict iteration to the top-left quarter
//!     let view = buffer.with_clip(Rect::new(0, 0, 4, 4));
//!     assert_eq!(view.clip(), Rect::new(0, 0, 4, 4));
//! }
//! assert_eq!(buffer.clip(), buffer.bounds());
//! ```

use std::ops::{Deref, DerefMut};

use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::{GfxError, GfxResult};
use crate::types::{Color, Rect, Size};

/// Supported pixel layouts.
///
/// Channel order is fixed per format: `[A, R, G, B]` when alpha is present,
/// `[R, G, B]` for [`PixelFormat::Rgb24`] and `[R, G, B, X]` for
/// [`PixelFormat::Rgb32`], where `X` is unused padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 24 bits per pixel, no alpha.
    Rgb24,
    /// 32 bits per pixel, no alpha.
    Rgb32,
    /// 32 bits per pixel, straight alpha.
    Argb32,
    /// 32 bits per pixel, premultiplied alpha.
    PArgb32,
}

impl PixelFormat {
    /// Bytes used by one pixel.
    #[inline]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb24 => 3,
            Self::Rgb32 | Self::Argb32 | Self::PArgb32 => 4,
        }
    }

    /// Whether this format stores an alpha channel.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Argb32 | Self::PArgb32)
    }

    /// Index of the alpha channel, if any.
    #[inline]
    pub const fn index_a(self) -> Option<usize> {
        if self.has_alpha() { Some(0) } else { None }
    }

    /// Index of the red channel.
    #[inline]
    pub const fn index_r(self) -> usize {
        if self.has_alpha() { 1 } else { 0 }
    }

    /// Index of the green channel.
    #[inline]
    pub const fn index_g(self) -> usize {
        self.index_r() + 1
    }

    /// Index of the blue channel.
    #[inline]
    pub const fn index_b(self) -> usize {
        self.index_r() + 2
    }

    /// Whether two pixels hold the same color.
    ///
    /// Only the color channels and alpha are compared. The padding byte of
    /// [`PixelFormat::Rgb32`] is ignored.
    #[inline]
    pub fn same_color(self, a: &[u8], b: &[u8]) -> bool {
        let r = self.index_r();
        a[r..r + 3] == b[r..r + 3] && self.index_a().is_none_or(|i| a[i] == b[i])
    }

    /// Read a color from one pixel's bytes.
    ///
    /// Premultiplied pixels are converted back to straight alpha. Formats
    /// without alpha read as opaque.
    pub fn decode(self, pixel: &[u8]) -> Color {
        let r = pixel[self.index_r()];
        let g = pixel[self.index_g()];
        let b = pixel[self.index_b()];
        match self {
            Self::Rgb24 | Self::Rgb32 => Color::from_rgb(r, g, b),
            Self::Argb32 => Color::from_argb(pixel[0], r, g, b),
            Self::PArgb32 => {
                let a = pixel[0];
                if a == 0 {
                    return Color::EMPTY;
                }
                let unmultiply = |c: u8| ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8;
                Color::from_argb(a, unmultiply(r), unmultiply(g), unmultiply(b))
            }
        }
    }

    /// Write a color into one pixel's bytes.
    pub fn encode(self, color: Color, pixel: &mut [u8]) {
        match self {
            Self::Rgb24 => {
                pixel[0] = color.r;
                pixel[1] = color.g;
                pixel[2] = color.b;
            }
            Self::Rgb32 => {
                pixel[0] = color.r;
                pixel[1] = color.g;
                pixel[2] = color.b;
                pixel[3] = 0xFF;
            }
            Self::Argb32 => {
                pixel[0] = color.a;
                pixel[1] = color.r;
                pixel[2] = color.g;
                pixel[3] = color.b;
            }
            Self::PArgb32 => {
                let a = color.a as u32;
                let premultiply = |c: u8| ((c as u32 * a + 127) / 255) as u8;
                pixel[0] = color.a;
                pixel[1] = premultiply(color.r);
                pixel[2] = premultiply(color.g);
                pixel[3] = premultiply(color.b);
            }
        }
    }
}

impl TryFrom<image::ColorType> for PixelFormat {
    type Error = GfxError;

    fn try_from(color_type: image::ColorType) -> GfxResult<Self> {
        match color_type {
            image::ColorType::Rgb8 => Ok(Self::Rgb24),
            image::ColorType::Rgba8 => Ok(Self::Argb32),
            other => Err(GfxError::UnsupportedFormat(format!("{:?}", other))),
        }
    }
}

/// An owned rectangular grid of pixels.
///
/// Pixels are stored row-major with no row padding, so the stride is
/// `width * bytes_per_pixel`. A clip rectangle (the full extent by default)
/// restricts which pixels filters such as the box blur touch.
///
/// Reads and writes take coordinates inside `[0, width) x [0, height)`.
/// Debug builds assert this; release builds rely on slice bounds checks.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
    clip: Rect,
}

impl PixelBuffer {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Create a zero-initialized buffer.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            width,
            height,
            format,
            data: vec![0; len],
            clip: Rect::new(0, 0, width as i32, height as i32),
        }
    }

    /// Create a buffer filled with a solid color.
    pub fn filled(width: u32, height: u32, format: PixelFormat, color: Color) -> Self {
        let mut buffer = Self::new(width, height, format);
        buffer.fill(color);
        buffer
    }

    /// Create a buffer from raw pixel bytes in the given format.
    pub fn from_raw(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> GfxResult<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(GfxError::DataSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
            clip: Rect::new(0, 0, width as i32, height as i32),
        })
    }

    /// Convert an RGBA image into a buffer of the requested format.
    pub fn from_rgba_image(image: &RgbaImage, format: PixelFormat) -> Self {
        let mut buffer = Self::new(image.width(), image.height(), format);
        let bpp = format.bytes_per_pixel();
        for (dst, src) in buffer.data.chunks_exact_mut(bpp).zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            format.encode(Color::from_argb(a, r, g, b), dst);
        }
        buffer
    }

    /// Create a buffer from a decoded image, keeping its layout.
    ///
    /// Only 8-bit RGB and RGBA images are accepted; anything else is rejected
    /// with [`GfxError::UnsupportedFormat`] before reaching an engine.
    pub fn from_dynamic_image(image: &DynamicImage) -> GfxResult<Self> {
        let format = PixelFormat::try_from(image.color())?;
        match image {
            DynamicImage::ImageRgb8(rgb) => {
                Self::from_raw(rgb.width(), rgb.height(), format, rgb.as_raw().clone())
            }
            DynamicImage::ImageRgba8(rgba) => Ok(Self::from_rgba_image(rgba, format)),
            _ => Err(GfxError::UnsupportedFormat(format!("{:?}", image.color()))),
        }
    }

    // ========================================================================
    // PROPERTIES
    // ========================================================================

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Dimensions as a (width, height) tuple.
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Dimensions as a [`Size`].
    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width as i32, self.height as i32)
    }

    /// The full extent as a rectangle at the origin.
    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width as i32, self.height as i32)
    }

    /// Whether the buffer has zero area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// The pixel format.
    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Whether the pixel format carries an alpha channel.
    #[inline]
    pub fn has_alpha(&self) -> bool {
        self.format.has_alpha()
    }

    /// Bytes per pixel.
    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Bytes per row.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// The raw byte store.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the buffer and return its raw byte store.
    #[inline]
    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of one row.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.stride();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    /// Mutable row slices, top to bottom.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        let stride = self.stride().max(1);
        self.data.chunks_exact_mut(stride)
    }

    // ========================================================================
    // CLIPPING
    // ========================================================================

    /// The current clip rectangle.
    #[inline]
    pub fn clip(&self) -> Rect {
        self.clip
    }

    /// Reset the clip rectangle to the full extent.
    pub fn reset_clip(&mut self) {
        self.clip = self.bounds();
    }

    /// Restrict the buffer to `rect ∩ full extent` for the lifetime of the view.
    ///
    /// The view shares the backing store; writes through it land in this
    /// buffer. The previous clip is restored when the view is dropped.
    pub fn with_clip(&mut self, rect: Rect) -> ClipView<'_> {
        let previous = self.clip;
        self.clip = rect.intersect(&self.bounds());
        ClipView {
            buffer: self,
            previous,
        }
    }

    // ========================================================================
    // PIXEL ACCESS
    // ========================================================================

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(
            x < self.width && y < self.height,
            "pixel ({}, {}) outside {}x{}",
            x,
            y,
            self.width,
            self.height
        );
        y as usize * self.stride() + x as usize * self.bytes_per_pixel()
    }

    /// Raw channel bytes of a pixel (3 or 4, per format).
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &[u8] {
        let offset = self.offset(x, y);
        &self.data[offset..offset + self.bytes_per_pixel()]
    }

    /// Overwrite the raw channel bytes of a pixel.
    ///
    /// `pixel` must hold exactly [`bytes_per_pixel`](Self::bytes_per_pixel) bytes.
    #[inline]
    pub fn set(&mut self, x: u32, y: u32, pixel: &[u8]) {
        let offset = self.offset(x, y);
        let bpp = self.bytes_per_pixel();
        self.data[offset..offset + bpp].copy_from_slice(pixel);
    }

    /// Raw channel bytes of a pixel, with coordinates clamped to the edge.
    ///
    /// This is the out-of-range policy for neighbourhood filters: a read at
    /// `x = -1` returns column 0, a read at `x = width` returns the last
    /// column. The buffer must not be empty.
    #[inline]
    pub fn get_clamped(&self, x: i32, y: i32) -> &[u8] {
        let x = (x as i64).clamp(0, self.width as i64 - 1) as u32;
        let y = (y as i64).clamp(0, self.height as i64 - 1) as u32;
        self.get(x, y)
    }

    /// Read the color of a pixel.
    #[inline]
    pub fn color_at(&self, x: u32, y: u32) -> Color {
        self.format.decode(self.get(x, y))
    }

    /// Read the color of a pixel with coordinates clamped to the edge.
    #[inline]
    pub fn color_at_clamped(&self, x: i32, y: i32) -> Color {
        self.format.decode(self.get_clamped(x, y))
    }

    /// Write the color of a pixel.
    #[inline]
    pub fn set_color_at(&mut self, x: u32, y: u32, color: Color) {
        let offset = self.offset(x, y);
        let bpp = self.bytes_per_pixel();
        self.format.encode(color, &mut self.data[offset..offset + bpp]);
    }

    /// Fill every pixel with a color, ignoring the clip.
    pub fn fill(&mut self, color: Color) {
        let bpp = self.bytes_per_pixel();
        let mut pixel = [0u8; 4];
        self.format.encode(color, &mut pixel[..bpp]);
        for dst in self.data.chunks_exact_mut(bpp) {
            dst.copy_from_slice(&pixel[..bpp]);
        }
    }

    // ========================================================================
    // EXPORT
    // ========================================================================

    /// Convert to a straight-alpha RGBA image.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let bpp = self.bytes_per_pixel();
        let mut image = RgbaImage::new(self.width, self.height);
        for (dst, src) in image.pixels_mut().zip(self.data.chunks_exact(bpp)) {
            let color = self.format.decode(src);
            *dst = Rgba([color.r, color.g, color.b, color.a]);
        }
        image
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("clip", &self.clip)
            .finish()
    }
}

/// A scoped, clipped view over a [`PixelBuffer`].
///
/// Created by [`PixelBuffer::with_clip`]. Holding the view borrows the buffer
/// mutably, so only one view can be active at a time.
pub struct ClipView<'a> {
    buffer: &'a mut PixelBuffer,
    previous: Rect,
}

impl Deref for ClipView<'_> {
    type Target = PixelBuffer;

    fn deref(&self) -> &PixelBuffer {
        self.buffer
    }
}

impl DerefMut for ClipView<'_> {
    fn deref_mut(&mut self) -> &mut PixelBuffer {
        self.buffer
    }
}

impl Drop for ClipView<'_> {
    fn drop(&mut self) {
        self.buffer.clip = self.previous;
    }
}

static_assertions::assert_impl_all!(PixelBuffer: Send, Sync, Clone);
