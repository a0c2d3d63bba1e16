//! Auto-crop detection.
//!
//! Finds the bounding box of content that differs from a background colour.
//! The background is either given explicitly or guessed from the four corner
//! pixels.

use pixelshot_core::{PerfSpan, ThreadPool, gfx_debug, gfx_warn};
use rayon::prelude::*;

use crate::pixel_buffer::PixelBuffer;
use crate::types::{Color, Point, Rect};

/// Inclusive (min_x, min_y, max_x, max_y) bounds of non-background pixels.
type Bounds = (u32, u32, u32, u32);

fn merge(a: Option<Bounds>, b: Option<Bounds>) -> Option<Bounds> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3))),
        (a, None) => a,
        (None, b) => b,
    }
}

#[inline]
fn is_background(color: Color, reference: Color, crop_difference: i32) -> bool {
    if crop_difference > 0 {
        color.rgb_distance(&reference) <= crop_difference
    } else {
        color == reference
    }
}

/// Find the rectangle of content that differs from `reference`.
///
/// With a positive `crop_difference` a pixel counts as background when the
/// mean absolute difference of its R, G and B channels is at most that
/// value; alpha is ignored. With zero, only exact matches are background.
///
/// Returns [`Rect::EMPTY`] when everything is background or when the content
/// already touches all four edges, since there is nothing to crop.
pub fn find_auto_crop_rectangle_for(buffer: &PixelBuffer, reference: Color, crop_difference: i32) -> Rect {
    content_rectangle(ThreadPool::global(), buffer, reference, crop_difference)
}

fn content_rectangle(pool: &ThreadPool, buffer: &PixelBuffer, reference: Color, crop_difference: i32) -> Rect {
    let (width, height) = buffer.dimensions();
    if buffer.is_empty() {
        return Rect::EMPTY;
    }

    let format = buffer.format();
    let bpp = buffer.bytes_per_pixel();
    let bounds = pool.execute(|| {
        (0..height)
            .into_par_iter()
            .map(|y| {
                let row = buffer.row(y);
                let mut hits = row
                    .chunks_exact(bpp)
                    .enumerate()
                    .filter(|(_, px)| !is_background(format.decode(px), reference, crop_difference))
                    .map(|(x, _)| x as u32);
                let first = hits.next()?;
                let last = hits.last().unwrap_or(first);
                Some((first, y, last, y))
            })
            .reduce(|| None, merge)
    });

    match bounds {
        None => Rect::EMPTY,
        Some((min_x, min_y, max_x, max_y)) => {
            if min_x == 0 && min_y == 0 && max_x == width - 1 && max_y == height - 1 {
                return Rect::EMPTY;
            }
            Rect::from_inclusive_corners(
                Point::new(min_x as i32, min_y as i32),
                Point::new(max_x as i32, max_y as i32),
            )
        }
    }
}

/// Find the crop rectangle using each corner colour as background.
///
/// Corners are tried top-left, bottom-left, top-right, bottom-right; the
/// largest candidate wins and earlier corners win ties.
pub fn find_auto_crop_rectangle(buffer: &PixelBuffer, crop_difference: i32) -> Rect {
    find_auto_crop_rectangle_with(ThreadPool::global(), buffer, crop_difference)
}

/// [`find_auto_crop_rectangle`] on the given worker pool.
pub fn find_auto_crop_rectangle_with(pool: &ThreadPool, buffer: &PixelBuffer, crop_difference: i32) -> Rect {
    if buffer.is_empty() {
        return Rect::EMPTY;
    }

    let _span = PerfSpan::new("find_auto_crop_rectangle");
    let (right, bottom) = (buffer.width() - 1, buffer.height() - 1);
    let corners = [(0, 0), (0, bottom), (right, 0), (right, bottom)];

    let mut best = Rect::EMPTY;
    for (x, y) in corners {
        let candidate = content_rectangle(pool, buffer, buffer.color_at(x, y), crop_difference);
        if candidate.area() > best.area() {
            best = candidate;
        }
    }

    gfx_debug!(
        width = buffer.width(),
        height = buffer.height(),
        crop_difference,
        result = ?best,
        "auto-crop"
    );
    best
}

/// Copy a region out of a buffer.
///
/// The rectangle is intersected with the buffer bounds first. Returns `None`
/// when nothing remains to copy.
pub fn crop(buffer: &PixelBuffer, rect: Rect) -> Option<PixelBuffer> {
    if buffer.is_empty() {
        gfx_warn!("crop requested on a zero-size image");
        return None;
    }
    let area = rect.intersect(&buffer.bounds());
    if area.is_empty() {
        gfx_warn!(rect = ?rect, "crop rectangle does not overlap the image");
        return None;
    }

    let bpp = buffer.bytes_per_pixel();
    let left = area.left() as usize * bpp;
    let len = area.width() as usize * bpp;
    let mut cropped = PixelBuffer::new(area.width() as u32, area.height() as u32, buffer.format());
    for (dst, y) in cropped.rows_mut().zip(area.top() as u32..area.bottom() as u32) {
        dst.copy_from_slice(&buffer.row(y)[left..left + len]);
    }
    Some(cropped)
}

/// Count the pixels matching a colour, optionally comparing alpha too.
pub fn count_colors(buffer: &PixelBuffer, color: Color, include_alpha: bool) -> usize {
    count_colors_with(ThreadPool::global(), buffer, color, include_alpha)
}

/// [`count_colors`] on the given worker pool.
pub fn count_colors_with(pool: &ThreadPool, buffer: &PixelBuffer, color: Color, include_alpha: bool) -> usize {
    if buffer.is_empty() {
        return 0;
    }
    let format = buffer.format();
    let bpp = buffer.bytes_per_pixel();
    pool.execute(|| {
        (0..buffer.height())
            .into_par_iter()
            .map(|y| {
                buffer
                    .row(y)
                    .chunks_exact(bpp)
                    .map(|px| format.decode(px))
                    .filter(|c| if include_alpha { *c == color } else { c.same_rgb(&color) })
                    .count()
            })
            .sum()
    })
}
