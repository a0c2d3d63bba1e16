//! 5x5 colour matrices.
//!
//! Colours are treated as row vectors `[r g b a 1]` with channels normalised
//! to `0.0..=1.0` and multiplied by the matrix. Results are clamped and
//! rounded back to 8 bits. Formats without alpha read as opaque, and any
//! alpha produced for them is dropped on write.

use pixelshot_core::ThreadPool;
use rayon::prelude::*;

use crate::pixel_buffer::PixelBuffer;
use crate::types::{Color, Rect};

/// A colour transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    /// `m[input][output]`, inputs and outputs in r, g, b, a, w order.
    pub m: [[f32; 5]; 5],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 0.0, 1.0],
        ],
    };

    /// Luminance-weighted grayscale.
    pub const fn grayscale() -> Self {
        Self {
            m: [
                [0.3, 0.3, 0.3, 0.0, 0.0],
                [0.59, 0.59, 0.59, 0.0, 0.0],
                [0.11, 0.11, 0.11, 0.0, 0.0],
                [0.0, 0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 0.0, 1.0],
            ],
        }
    }

    /// Multiply each colour channel by the matching channel of `color`.
    pub fn tint(color: Color) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.m[0][0] = color.r as f32 / 255.0;
        matrix.m[1][1] = color.g as f32 / 255.0;
        matrix.m[2][2] = color.b as f32 / 255.0;
        matrix
    }

    /// Black with the source alpha scaled by `darkness`.
    ///
    /// This is the mask a drop shadow is blurred from.
    pub fn shadow_mask(darkness: f32) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.m[0][0] = 0.0;
        matrix.m[1][1] = 0.0;
        matrix.m[2][2] = 0.0;
        matrix.m[3][3] = darkness;
        matrix
    }

    /// Transform one colour.
    pub fn apply(&self, color: Color) -> Color {
        let input = [
            color.r as f32 / 255.0,
            color.g as f32 / 255.0,
            color.b as f32 / 255.0,
            color.a as f32 / 255.0,
            1.0,
        ];
        let channel = |j: usize| {
            let sum: f32 = input.iter().zip(&self.m).map(|(v, row)| v * row[j]).sum();
            (sum.clamp(0.0, 1.0) * 255.0).round() as u8
        };
        Color::from_argb(channel(3), channel(0), channel(1), channel(2))
    }
}

/// Copy a transformed region of `source` into `dest`.
///
/// An empty rectangle stands for the whole image. The copied area is the
/// smaller of the two rectangles, clipped to both buffers. Destination
/// pixels are overwritten, not blended.
pub fn apply_color_matrix(
    source: &PixelBuffer,
    source_rect: Rect,
    dest: &mut PixelBuffer,
    dest_rect: Rect,
    matrix: &ColorMatrix,
) {
    apply_color_matrix_with(ThreadPool::global(), source, source_rect, dest, dest_rect, matrix);
}

/// [`apply_color_matrix`] on the given worker pool.
pub fn apply_color_matrix_with(
    pool: &ThreadPool,
    source: &PixelBuffer,
    source_rect: Rect,
    dest: &mut PixelBuffer,
    dest_rect: Rect,
    matrix: &ColorMatrix,
) {
    let source_rect = if source_rect.is_empty() { source.bounds() } else { source_rect };
    let dest_rect = if dest_rect.is_empty() { dest.bounds() } else { dest_rect };

    // Clip against the source, then carry the offset into destination space
    let src = source_rect.intersect(&source.bounds());
    let (dx, dy) = (
        dest_rect.left() + (src.left() - source_rect.left()),
        dest_rect.top() + (src.top() - source_rect.top()),
    );
    let width = src.width().min(dest_rect.right() - dx);
    let height = src.height().min(dest_rect.bottom() - dy);
    let target = Rect::new(dx, dy, width, height).intersect(&dest.bounds());
    if target.is_empty() {
        return;
    }
    // Source origin matching the clipped target
    let (sx, sy) = (src.left() + target.left() - dx, src.top() + target.top() - dy);

    let src_format = source.format();
    let dst_format = dest.format();
    let src_bpp = source.bytes_per_pixel();
    let dst_bpp = dest.bytes_per_pixel();
    let stride = dest.stride();
    let (left, top) = (target.left() as usize, target.top() as usize);
    let (w, h) = (target.width() as usize, target.height() as usize);

    let rows = &mut dest.as_bytes_mut()[top * stride..(top + h) * stride];
    pool.execute(|| {
        rows.par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(i, row)| {
                let src_row = source.row(sy as u32 + i as u32);
                for j in 0..w {
                    let so = (sx as usize + j) * src_bpp;
                    let color = matrix.apply(src_format.decode(&src_row[so..so + src_bpp]));
                    let dox = (left + j) * dst_bpp;
                    dst_format.encode(color, &mut row[dox..dox + dst_bpp]);
                }
            });
    });
}

/// Transform every pixel of a buffer in place.
pub fn apply_color_matrix_in_place(buffer: &mut PixelBuffer, matrix: &ColorMatrix) {
    apply_color_matrix_in_place_with(ThreadPool::global(), buffer, matrix);
}

/// [`apply_color_matrix_in_place`] on the given worker pool.
pub fn apply_color_matrix_in_place_with(pool: &ThreadPool, buffer: &mut PixelBuffer, matrix: &ColorMatrix) {
    if buffer.is_empty() {
        return;
    }
    let format = buffer.format();
    let bpp = buffer.bytes_per_pixel();
    let data = buffer.as_bytes_mut();
    pool.execute(|| {
        data.par_chunks_exact_mut(bpp).for_each(|px| {
            let color = matrix.apply(format.decode(px));
            format.encode(color, px);
        });
    });
}
