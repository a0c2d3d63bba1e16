//! Scale2x and Scale3x edge-preserving upscalers.
//!
//! Each source pixel `E` expands into a 2x2 (or 3x3) block chosen from its
//! neighbours:
//!
//! ```text
//!   A B C
//!   D E F
//!   G H I
//! ```
//!
//! Interpolation only happens when `B != H` and `D != F`; otherwise the block
//! is a flat copy of `E`. Neighbours outside the image clamp to the nearest
//! edge pixel. Two pixels match when their color channels and alpha are equal;
//! the padding byte of 32-bit formats without alpha is ignored.
//!
//! Destination rows are produced in parallel. Each unit reads the shared
//! source and writes only its own group of 2 (or 3) output rows.

use pixelshot_core::{PerfSpan, ThreadPool, gfx_debug};
use rayon::prelude::*;

use crate::error::{GfxError, GfxResult};
use crate::pixel_buffer::PixelBuffer;

/// Upscale by 2 with Scale2x on the global worker pool.
pub fn scale2x(source: &PixelBuffer) -> GfxResult<PixelBuffer> {
    scale2x_with(ThreadPool::global(), source)
}

/// Upscale by 3 with Scale3x on the global worker pool.
pub fn scale3x(source: &PixelBuffer) -> GfxResult<PixelBuffer> {
    scale3x_with(ThreadPool::global(), source)
}

/// Upscale by 2 with Scale2x on the given worker pool.
///
/// The result has the source format and exactly twice its dimensions.
pub fn scale2x_with(pool: &ThreadPool, source: &PixelBuffer) -> GfxResult<PixelBuffer> {
    let mut dest = scaled_buffer(source, 2)?;
    if source.is_empty() {
        return Ok(dest);
    }

    let _span = PerfSpan::new("scale2x");
    gfx_debug!(width = source.width(), height = source.height(), format = ?source.format(), "scale2x");

    let bpp = source.bytes_per_pixel();
    let stride = dest.stride();
    let width = source.width() as i32;
    let format = source.format();
    let same = |p: &[u8], q: &[u8]| format.same_color(p, q);

    pool.execute(|| {
        dest.as_bytes_mut()
            .par_chunks_exact_mut(stride * 2)
            .enumerate()
            .for_each(|(y, rows)| {
                let y = y as i32;
                let (upper, lower) = rows.split_at_mut(stride);
                for x in 0..width {
                    let e = source.get_clamped(x, y);
                    let b = source.get_clamped(x, y - 1);
                    let h = source.get_clamped(x, y + 1);
                    let d = source.get_clamped(x - 1, y);
                    let f = source.get_clamped(x + 1, y);

                    let block = if !same(b, h) && !same(d, f) {
                        [
                            if same(d, b) { d } else { e },
                            if same(b, f) { f } else { e },
                            if same(d, h) { d } else { e },
                            if same(h, f) { f } else { e },
                        ]
                    } else {
                        [e; 4]
                    };

                    let ox = x as usize * 2 * bpp;
                    upper[ox..ox + bpp].copy_from_slice(block[0]);
                    upper[ox + bpp..ox + 2 * bpp].copy_from_slice(block[1]);
                    lower[ox..ox + bpp].copy_from_slice(block[2]);
                    lower[ox + bpp..ox + 2 * bpp].copy_from_slice(block[3]);
                }
            });
    });

    Ok(dest)
}

/// Upscale by 3 with Scale3x on the given worker pool.
///
/// The result has the source format and exactly three times its dimensions.
pub fn scale3x_with(pool: &ThreadPool, source: &PixelBuffer) -> GfxResult<PixelBuffer> {
    let mut dest = scaled_buffer(source, 3)?;
    if source.is_empty() {
        return Ok(dest);
    }

    let _span = PerfSpan::new("scale3x");
    gfx_debug!(width = source.width(), height = source.height(), format = ?source.format(), "scale3x");

    let bpp = source.bytes_per_pixel();
    let stride = dest.stride();
    let width = source.width() as i32;
    let format = source.format();
    let same = |p: &[u8], q: &[u8]| format.same_color(p, q);

    pool.execute(|| {
        dest.as_bytes_mut()
            .par_chunks_exact_mut(stride * 3)
            .enumerate()
            .for_each(|(y, rows)| {
                let y = y as i32;
                let (top, rest) = rows.split_at_mut(stride);
                let (middle, bottom) = rest.split_at_mut(stride);
                for x in 0..width {
                    let a = source.get_clamped(x - 1, y - 1);
                    let b = source.get_clamped(x, y - 1);
                    let c = source.get_clamped(x + 1, y - 1);
                    let d = source.get_clamped(x - 1, y);
                    let e = source.get_clamped(x, y);
                    let f = source.get_clamped(x + 1, y);
                    let g = source.get_clamped(x - 1, y + 1);
                    let h = source.get_clamped(x, y + 1);
                    let i = source.get_clamped(x + 1, y + 1);

                    let (db, bf, dh, hf) = (same(d, b), same(b, f), same(d, h), same(h, f));
                    let block = if !same(b, h) && !same(d, f) {
                        [
                            if db { d } else { e },
                            if (db && !same(e, c)) || (bf && !same(e, a)) { b } else { e },
                            if bf { f } else { e },
                            if (db && !same(e, g)) || (dh && !same(e, a)) { d } else { e },
                            e,
                            if (bf && !same(e, i)) || (hf && !same(e, c)) { f } else { e },
                            if dh { d } else { e },
                            if (dh && !same(e, i)) || (hf && !same(e, g)) { h } else { e },
                            if hf { f } else { e },
                        ]
                    } else {
                        [e; 9]
                    };

                    let ox = x as usize * 3 * bpp;
                    for (k, row) in [&mut *top, &mut *middle, &mut *bottom].into_iter().enumerate() {
                        for j in 0..3 {
                            let start = ox + j * bpp;
                            row[start..start + bpp].copy_from_slice(block[k * 3 + j]);
                        }
                    }
                }
            });
    });

    Ok(dest)
}

fn scaled_buffer(source: &PixelBuffer, factor: u32) -> GfxResult<PixelBuffer> {
    let overflow = || GfxError::InvalidDimensions {
        width: source.width() as i64 * factor as i64,
        height: source.height() as i64 * factor as i64,
    };
    let width = source.width().checked_mul(factor).ok_or_else(overflow)?;
    let height = source.height().checked_mul(factor).ok_or_else(overflow)?;
    Ok(PixelBuffer::new(width, height, source.format()))
}
