//! Higher-level image operations built from the engines.
//!
//! Operations that change the canvas geometry take a [`Transform2D`] and
//! append the movement of the image content to it.

use pixelshot_core::{PerfSpan, gfx_debug, gfx_warn};

use crate::blur::box_blur;
use crate::color_matrix::{ColorMatrix, apply_color_matrix};
use crate::error::{GfxError, GfxResult};
use crate::pixel_buffer::{PixelBuffer, PixelFormat};
use crate::resample::{ResizeFilter, resample};
use crate::scale::{scale2x, scale3x};
use crate::transform::Transform2D;
use crate::types::{Color, Point, Rect, Size};

/// Screen DPI at which icons are shown at their base size.
pub const DEFAULT_SCREEN_DPI: f64 = 96.0;

// ============================================================================
// OPTIONS
// ============================================================================

/// Drop shadow configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowOptions {
    /// Shadow opacity, `0.0..=1.0`.
    pub darkness: f32,
    /// Shadow spread in pixels. Blurring uses the next odd value.
    pub shadow_size: i32,
    /// Extra displacement of the original content.
    pub offset: Point,
    /// Format of the returned canvas.
    pub target_format: PixelFormat,
}

impl Default for ShadowOptions {
    fn default() -> Self {
        Self {
            darkness: 0.6,
            shadow_size: 7,
            offset: Point::new(-1, -1),
            target_format: PixelFormat::Argb32,
        }
    }
}

impl ShadowOptions {
    pub fn with_darkness(mut self, darkness: f32) -> Self {
        self.darkness = darkness.clamp(0.0, 1.0);
        self
    }

    pub fn with_shadow_size(mut self, shadow_size: i32) -> Self {
        self.shadow_size = shadow_size;
        self
    }

    pub fn with_offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_target_format(mut self, format: PixelFormat) -> Self {
        self.target_format = format;
        self
    }
}

/// Resize configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeOptions {
    /// Keep the source aspect ratio.
    pub maintain_aspect_ratio: bool,
    /// With `maintain_aspect_ratio`, output the requested size and centre
    /// the scaled image on it.
    pub canvas_use_new_size: bool,
    /// Fill for canvas areas the image does not cover.
    pub background: Color,
    /// Requested width. Zero means unconstrained.
    pub width: i32,
    /// Requested height. Zero means unconstrained.
    pub height: i32,
    pub filter: ResizeFilter,
}

impl ResizeOptions {
    /// Resize to `width` x `height`, ignoring the aspect ratio.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            maintain_aspect_ratio: false,
            canvas_use_new_size: false,
            background: Color::EMPTY,
            width,
            height,
            filter: ResizeFilter::default(),
        }
    }

    pub fn with_aspect_ratio(mut self, maintain: bool) -> Self {
        self.maintain_aspect_ratio = maintain;
        self
    }

    pub fn with_canvas(mut self, background: Color) -> Self {
        self.canvas_use_new_size = true;
        self.background = background;
        self
    }

    pub fn with_filter(mut self, filter: ResizeFilter) -> Self {
        self.filter = filter;
        self
    }
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// Source-over blend of two straight-alpha colours.
fn blend_over(dst: Color, src: Color) -> Color {
    if src.a == 255 {
        return src;
    }
    if src.a == 0 {
        return dst;
    }

    let src_a = src.a as f32 / 255.0;
    let dst_a = dst.a as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a == 0.0 {
        return Color::EMPTY;
    }

    let blend = |s: u8, d: u8| -> u8 {
        let sf = s as f32 / 255.0;
        let df = d as f32 / 255.0;
        let result = (sf * src_a + df * dst_a * (1.0 - src_a)) / out_a;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };
    Color::from_argb(
        (out_a * 255.0).round() as u8,
        blend(src.r, dst.r),
        blend(src.g, dst.g),
        blend(src.b, dst.b),
    )
}

/// Draw `source` onto `dest` at (x, y) without scaling.
///
/// Pixels falling outside `dest` are skipped. Sources without alpha are
/// copied; others are blended over the destination.
pub fn draw_image(dest: &mut PixelBuffer, source: &PixelBuffer, x: i32, y: i32) {
    let target = Rect::from_origin_size(Point::new(x, y), source.size()).intersect(&dest.bounds());
    if target.is_empty() {
        return;
    }
    let opaque = !source.has_alpha();
    for dy in target.top()..target.bottom() {
        for dx in target.left()..target.right() {
            let src = source.color_at((dx - x) as u32, (dy - y) as u32);
            let (dx, dy) = (dx as u32, dy as u32);
            let color = if opaque { src } else { blend_over(dest.color_at(dx, dy), src) };
            dest.set_color_at(dx, dy, color);
        }
    }
}

fn checked_dimension(value: i64, width: i64, height: i64) -> GfxResult<u32> {
    u32::try_from(value).map_err(|_| GfxError::InvalidDimensions { width, height })
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Threshold an image to black and white.
///
/// Pixels whose mean R, G, B falls below `threshold` become black, the rest
/// white. Alpha is kept.
pub fn create_monochrome(source: &PixelBuffer, threshold: u8) -> PixelBuffer {
    let mut result = source.clone();
    let (width, height) = source.dimensions();
    for y in 0..height {
        for x in 0..width {
            let color = source.color_at(x, y);
            let brightness = (color.r as u32 + color.g as u32 + color.b as u32) / 3;
            let mono = if brightness < threshold as u32 { Color::BLACK } else { Color::WHITE };
            result.set_color_at(x, y, mono.with_alpha(color.a));
        }
    }
    result
}

/// Create a new image with a blurred drop shadow behind `source`.
///
/// The canvas grows by `2 * shadow_size` in both directions. The content is
/// moved by `offset + (shadow_size - 1, shadow_size - 1)`, which is also
/// appended to `transform`.
pub fn create_shadow(
    source: &PixelBuffer,
    options: &ShadowOptions,
    transform: &mut Transform2D,
) -> GfxResult<PixelBuffer> {
    let _span = PerfSpan::new("create_shadow");
    let size = options.shadow_size.max(0);
    let offset = options.offset.offset(size - 1, size - 1);
    transform.append_translation(offset.x as f32, offset.y as f32);

    let width = source.width() as i64 + 2 * size as i64;
    let height = source.height() as i64 + 2 * size as i64;
    let mut canvas = PixelBuffer::filled(
        checked_dimension(width, width, height)?,
        checked_dimension(height, width, height)?,
        options.target_format,
        Color::EMPTY,
    );

    gfx_debug!(
        width = source.width(),
        height = source.height(),
        shadow_size = size,
        darkness = options.darkness,
        "create shadow"
    );

    let blur_size = if size & 1 == 0 { size + 1 } else { size };
    apply_color_matrix(
        source,
        Rect::EMPTY,
        &mut canvas,
        Rect::from_origin_size(Point::new(blur_size, blur_size), source.size()),
        &ColorMatrix::shadow_mask(options.darkness),
    );
    box_blur(&mut canvas, blur_size)?;
    draw_image(&mut canvas, source, offset.x, offset.y);
    Ok(canvas)
}

/// Pad an image with a background colour.
///
/// The translation `(left, top)` is appended to `transform`.
pub fn resize_canvas(
    source: &PixelBuffer,
    background: Color,
    left: i32,
    right: i32,
    top: i32,
    bottom: i32,
    transform: &mut Transform2D,
) -> GfxResult<PixelBuffer> {
    let width = source.width() as i64 + left as i64 + right as i64;
    let height = source.height() as i64 + top as i64 + bottom as i64;
    let mut canvas = PixelBuffer::filled(
        checked_dimension(width, width, height)?,
        checked_dimension(height, width, height)?,
        source.format(),
        background,
    );
    transform.append_translation(left as f32, top as f32);
    draw_image(&mut canvas, source, left, top);
    Ok(canvas)
}

/// Offset that centres `scaled` pixels of content on `available` pixels.
fn centre_offset(available: i32, scaled: f32) -> i32 {
    (((available as f32 - scaled) / 2.0).round_ties_even() as i32).max(0)
}

/// Resize an image.
///
/// With `maintain_aspect_ratio` a single scale factor is used for both axes.
/// An axis requested at its current size, or at zero, is unconstrained and
/// follows the other axis. Otherwise the smaller factor wins so the result
/// fits the requested box. With `canvas_use_new_size` as well, the output
/// has exactly the requested size and the scaled image is centred on it.
///
/// Without `maintain_aspect_ratio` the output has exactly the requested
/// size; a zero dimension keeps the source dimension.
///
/// The scale from source to output is appended to `transform`.
pub fn resize(
    source: &PixelBuffer,
    options: &ResizeOptions,
    transform: Option<&mut Transform2D>,
) -> GfxResult<PixelBuffer> {
    if options.width < 0 || options.height < 0 {
        return Err(GfxError::InvalidDimensions {
            width: options.width as i64,
            height: options.height as i64,
        });
    }
    if source.is_empty() {
        gfx_warn!("resize requested on a zero-size image");
        return Ok(PixelBuffer::filled(
            options.width as u32,
            options.height as u32,
            source.format(),
            options.background,
        ));
    }

    let _span = PerfSpan::new("resize");
    let (src_w, src_h) = (source.width() as i32, source.height() as i32);
    let (mut new_w, mut new_h) = (options.width, options.height);
    let mut pw = new_w as f32 / src_w as f32;
    let mut ph = new_h as f32 / src_h as f32;
    let (mut dest_x, mut dest_y) = (0, 0);
    let (mut dest_w, mut dest_h) = (new_w, new_h);
    let canvas = options.maintain_aspect_ratio && options.canvas_use_new_size;

    if options.maintain_aspect_ratio {
        let follow_height = new_w == 0 || pw == 1.0 || (new_h != 0 && ph != 1.0 && ph < pw);
        if follow_height && new_h != 0 {
            pw = ph;
            dest_w = (src_w as f32 * pw) as i32;
            if canvas && new_w != 0 {
                dest_x = centre_offset(new_w, src_w as f32 * pw);
            }
        } else if new_w != 0 {
            ph = pw;
            dest_h = (src_h as f32 * ph) as i32;
            if canvas && new_h != 0 {
                dest_y = centre_offset(new_h, src_h as f32 * ph);
            }
        } else {
            // Nothing requested on either axis
            dest_w = src_w;
            dest_h = src_h;
        }
    } else {
        if dest_w == 0 {
            dest_w = src_w;
        }
        if dest_h == 0 {
            dest_h = src_h;
        }
    }

    if new_w == 0 {
        new_w = dest_w;
    }
    if new_h == 0 {
        new_h = dest_h;
    }

    let (out_w, out_h) = if canvas { (new_w, new_h) } else { (dest_w, dest_h) };
    gfx_debug!(
        from = ?source.dimensions(),
        scaled = ?(dest_w, dest_h),
        output = ?(out_w, out_h),
        "resize"
    );

    if let Some(transform) = transform {
        transform.append_scale(out_w as f32 / src_w as f32, out_h as f32 / src_h as f32);
    }

    let scaled = resample(source, dest_w.max(0) as u32, dest_h.max(0) as u32, options.filter);
    if !canvas {
        return Ok(scaled);
    }
    let mut result = PixelBuffer::filled(out_w as u32, out_h as u32, source.format(), options.background);
    draw_image(&mut result, &scaled, dest_x, dest_y);
    Ok(result)
}

/// Scale both dimensions by a percentage.
pub fn scale_by_percent(source: &PixelBuffer, percent: i32) -> GfxResult<PixelBuffer> {
    let factor = percent as f32 / 100.0;
    let width = (source.width() as f32 * factor) as i32;
    let height = (source.height() as f32 * factor) as i32;
    if width <= 0 || height <= 0 {
        return Err(GfxError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }
    Ok(resample(source, width as u32, height as u32, ResizeFilter::CatmullRom))
}

/// Create a thumbnail.
///
/// A negative `thumb_width` or `thumb_height` is derived from the other one
/// through the source aspect ratio. Positive `max_width` / `max_height`
/// shrink the result further, again keeping the aspect ratio.
pub fn create_thumbnail(
    source: &PixelBuffer,
    mut thumb_width: i32,
    mut thumb_height: i32,
    max_width: i32,
    max_height: i32,
) -> GfxResult<PixelBuffer> {
    let src_w = source.width() as f32;
    let src_h = source.height() as f32;
    if thumb_height < 0 {
        thumb_height = (thumb_width as f32 * (src_h / src_w)) as i32;
    }
    if thumb_width < 0 {
        thumb_width = (thumb_height as f32 * (src_w / src_h)) as i32;
    }
    if max_width > 0 && thumb_width > max_width {
        thumb_width = max_width;
        thumb_height = (thumb_width as f32 * (src_h / src_w)) as i32;
    }
    if max_height > 0 && thumb_height > max_height {
        thumb_height = max_height;
        thumb_width = (thumb_height as f32 * (src_w / src_h)) as i32;
    }

    if thumb_width < 0 || thumb_height < 0 {
        return Err(GfxError::InvalidDimensions {
            width: thumb_width as i64,
            height: thumb_height as i64,
        });
    }
    Ok(resample(source, thumb_width as u32, thumb_height as u32, ResizeFilter::CatmullRom))
}

/// Prepare an icon for display at the given screen DPI.
///
/// Integer factors of 2, 3 and 4 use the edge-preserving upscalers; other
/// sizes fall back to a nearest-neighbour resize.
pub fn scale_icon_for_displaying(original: &PixelBuffer, dpi: f64, base_size: u32) -> GfxResult<PixelBuffer> {
    let dpi = dpi.max(DEFAULT_SCREEN_DPI);
    let width = (base_size as f64 * dpi / DEFAULT_SCREEN_DPI) as u32;

    // Four times any u32 width fits in u64
    let (target, current) = (width as u64, original.width() as u64);

    if target == current {
        return Ok(original.clone());
    }
    if target == current * 2 {
        return scale2x(original);
    }
    if target == current * 3 {
        return scale3x(original);
    }
    if target == current * 4 {
        return scale2x(&scale2x(original)?);
    }

    let side = i32::try_from(width).map_err(|_| GfxError::InvalidDimensions {
        width: width as i64,
        height: width as i64,
    })?;
    let options = ResizeOptions::new(side, side)
        .with_aspect_ratio(true)
        .with_filter(ResizeFilter::Nearest);
    resize(original, &options, None)
}

/// Area a filter is applied to.
///
/// Inverted filters cover the whole image; others cover `rect` clipped to it.
pub fn create_intersect_rectangle(apply_size: Size, rect: Rect, invert: bool) -> Rect {
    let apply_rect = Rect::from_origin_size(Point::ZERO, apply_size);
    if invert {
        apply_rect
    } else {
        rect.intersect(&apply_rect)
    }
}
