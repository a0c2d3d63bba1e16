//! Separable box blur.
//!
//! A blur runs four passes over the clip rectangle: horizontal, vertical,
//! horizontal, vertical. Each pass replaces every channel with the mean of a
//! sliding window of `range` pixels centred on it. Near the clip edges the
//! window is truncated, so the divisor is the number of pixels that actually
//! fell inside.
//!
//! Horizontal passes process rows in parallel and write each row in place.
//! Vertical passes compute every column into scratch storage from a shared
//! borrow of the pass input, then scatter the results back row by row. A pass
//! returns only after all of its units are done, so the next pass always sees
//! complete results.

use pixelshot_core::{PerfSpan, ThreadPool, gfx_debug};
use rayon::prelude::*;

use crate::error::{GfxError, GfxResult};
use crate::pixel_buffer::{PixelBuffer, PixelFormat};
use crate::types::Rect;

/// Blur a buffer in place on the global worker pool.
///
/// An even `range` is raised to the next odd value. A resulting range of 1
/// or less leaves the buffer untouched.
pub fn box_blur(buffer: &mut PixelBuffer, range: i32) -> GfxResult<()> {
    box_blur_with(ThreadPool::global(), buffer, range)
}

/// Blur a buffer in place on the given worker pool.
pub fn box_blur_with(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32) -> GfxResult<()> {
    let range = if range & 1 == 0 { range + 1 } else { range };
    if range <= 1 {
        return Ok(());
    }
    if buffer.clip().is_empty() {
        return Ok(());
    }

    let _span = PerfSpan::new("box_blur");
    gfx_debug!(
        width = buffer.width(),
        height = buffer.height(),
        format = ?buffer.format(),
        clip = ?buffer.clip(),
        range,
        "box blur"
    );

    if buffer.has_alpha() {
        for _ in 0..2 {
            blur_horizontal_alpha(pool, buffer, range)?;
            blur_vertical_alpha(pool, buffer, range)?;
        }
    } else {
        for _ in 0..2 {
            blur_horizontal(pool, buffer, range)?;
            blur_vertical(pool, buffer, range)?;
        }
    }
    Ok(())
}

/// One horizontal pass over A, R, G and B.
pub fn blur_horizontal_alpha(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32) -> GfxResult<()> {
    let channels = alpha_channels("blur_horizontal_alpha", buffer.format())?;
    horizontal_pass(pool, buffer, range, channels);
    Ok(())
}

/// One vertical pass over A, R, G and B.
pub fn blur_vertical_alpha(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32) -> GfxResult<()> {
    let channels = alpha_channels("blur_vertical_alpha", buffer.format())?;
    vertical_pass(pool, buffer, range, channels);
    Ok(())
}

/// One horizontal pass over R, G and B.
pub fn blur_horizontal(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32) -> GfxResult<()> {
    let channels = color_channels("blur_horizontal", buffer.format())?;
    horizontal_pass(pool, buffer, range, channels);
    Ok(())
}

/// One vertical pass over R, G and B.
pub fn blur_vertical(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32) -> GfxResult<()> {
    let channels = color_channels("blur_vertical", buffer.format())?;
    vertical_pass(pool, buffer, range, channels);
    Ok(())
}

fn alpha_channels(operation: &'static str, format: PixelFormat) -> GfxResult<[usize; 4]> {
    match format.index_a() {
        Some(a) => Ok([a, format.index_r(), format.index_g(), format.index_b()]),
        None => Err(GfxError::invalid_operation(
            operation,
            format!("{:?} has no alpha channel", format),
        )),
    }
}

fn color_channels(operation: &'static str, format: PixelFormat) -> GfxResult<[usize; 3]> {
    if format.has_alpha() {
        return Err(GfxError::invalid_operation(
            operation,
            format!("{:?} carries alpha, use the alpha pass", format),
        ));
    }
    Ok([format.index_r(), format.index_g(), format.index_b()])
}

/// Clip bounds as unsigned (left, top, right, bottom).
fn clip_bounds(clip: Rect) -> (usize, usize, usize, usize) {
    (
        clip.left() as usize,
        clip.top() as usize,
        clip.right() as usize,
        clip.bottom() as usize,
    )
}

#[inline]
fn read_pixel<const N: usize>(data: &[u8], offset: usize, channels: &[usize; N]) -> [u8; N] {
    let mut px = [0u8; N];
    for (value, &channel) in px.iter_mut().zip(channels) {
        *value = data[offset + channel];
    }
    px
}

#[inline]
fn write_pixel<const N: usize>(data: &mut [u8], offset: usize, channels: &[usize; N], px: &[u8; N]) {
    for (&value, &channel) in px.iter().zip(channels) {
        data[offset + channel] = value;
    }
}

/// Sliding-window mean over a line of `len` pixels.
///
/// `sample(i)` returns the channels of the i-th pixel of the line.
fn moving_average<const N: usize>(len: usize, range: i32, sample: impl Fn(usize) -> [u8; N]) -> Vec<[u8; N]> {
    let half = (range / 2) as isize;
    let len_i = len as isize;
    let mut out = Vec::with_capacity(len);
    let mut sums = [0i32; N];
    let mut hits = 0i32;

    for pos in -half..len_i {
        let old = pos - half - 1;
        if old >= 0 {
            let px = sample(old as usize);
            for (sum, value) in sums.iter_mut().zip(px) {
                *sum -= value as i32;
            }
            hits -= 1;
        }

        let new = pos + half;
        if new < len_i {
            let px = sample(new as usize);
            for (sum, value) in sums.iter_mut().zip(px) {
                *sum += value as i32;
            }
            hits += 1;
        }

        if pos >= 0 {
            // The window always contains `pos` itself here
            let mut px = [0u8; N];
            for (value, sum) in px.iter_mut().zip(sums) {
                *value = (sum / hits) as u8;
            }
            out.push(px);
        }
    }
    out
}

fn horizontal_pass<const N: usize>(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32, channels: [usize; N]) {
    let (left, top, right, bottom) = clip_bounds(buffer.clip());
    if range <= 1 || left >= right || top >= bottom {
        return;
    }
    let bpp = buffer.bytes_per_pixel();
    let stride = buffer.stride();
    let rows = &mut buffer.as_bytes_mut()[top * stride..bottom * stride];

    pool.execute(|| {
        rows.par_chunks_exact_mut(stride).for_each(|row| {
            let src: &[u8] = row;
            let line = moving_average(right - left, range, |i| {
                read_pixel(src, (left + i) * bpp, &channels)
            });
            for (i, px) in line.iter().enumerate() {
                write_pixel(row, (left + i) * bpp, &channels, px);
            }
        });
    });
}

fn vertical_pass<const N: usize>(pool: &ThreadPool, buffer: &mut PixelBuffer, range: i32, channels: [usize; N]) {
    let (left, top, right, bottom) = clip_bounds(buffer.clip());
    if range <= 1 || left >= right || top >= bottom {
        return;
    }
    let bpp = buffer.bytes_per_pixel();
    let stride = buffer.stride();

    pool.execute(|| {
        let data = buffer.as_bytes();
        let columns: Vec<Vec<[u8; N]>> = (left..right)
            .into_par_iter()
            .map(|x| {
                moving_average(bottom - top, range, |i| {
                    read_pixel(data, (top + i) * stride + x * bpp, &channels)
                })
            })
            .collect();

        let rows = &mut buffer.as_bytes_mut()[top * stride..bottom * stride];
        rows.par_chunks_exact_mut(stride)
            .enumerate()
            .for_each(|(i, row)| {
                for (column, x) in columns.iter().zip(left..right) {
                    write_pixel(row, x * bpp, &channels, &column[i]);
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use pixelshot_core::ThreadPoolConfig;

    fn pool() -> ThreadPool {
        ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap()
    }

    fn gradient(width: u32, height: u32, format: PixelFormat) -> PixelBuffer {
        let mut buffer = PixelBuffer::new(width, height, format);
        for y in 0..height {
            for x in 0..width {
                let v = ((x * 37 + y * 11) % 256) as u8;
                buffer.set_color_at(x, y, Color::from_argb(255 - v, v, v / 2, 255 - v / 3));
            }
        }
        buffer
    }

    #[test]
    fn test_range_one_or_less_is_noop() {
        let pool = pool();
        let original = gradient(9, 7, PixelFormat::Argb32);
        for range in [-3, -1, 0, 1] {
            let mut buffer = original.clone();
            box_blur_with(&pool, &mut buffer, range).unwrap();
            assert_eq!(buffer, original, "range {}", range);
        }
    }

    #[test]
    fn test_even_range_rounds_up() {
        let pool = pool();
        let mut even = gradient(12, 10, PixelFormat::Rgb24);
        let mut odd = even.clone();
        box_blur_with(&pool, &mut even, 4).unwrap();
        box_blur_with(&pool, &mut odd, 5).unwrap();
        assert_eq!(even, odd);
    }

    #[test]
    fn test_uniform_buffer_unchanged() {
        let pool = pool();
        for format in [PixelFormat::Rgb24, PixelFormat::Rgb32, PixelFormat::Argb32, PixelFormat::PArgb32] {
            let original = PixelBuffer::filled(16, 9, format, Color::from_argb(200, 12, 99, 240));
            let mut buffer = original.clone();
            box_blur_with(&pool, &mut buffer, 7).unwrap();
            assert_eq!(buffer, original, "{:?}", format);
        }
    }

    #[test]
    fn test_red_rgb24_stays_red() {
        let mut buffer = PixelBuffer::filled(4, 4, PixelFormat::Rgb24, Color::RED);
        box_blur(&mut buffer, 3).unwrap();
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(buffer.get(x, y), &[255, 0, 0]);
            }
        }
    }

    #[test]
    fn test_moving_average_truncated_window() {
        let line = [[0u8], [30], [60], [90]];
        let out = moving_average(4, 3, |i| line[i]);
        // Edges average two pixels, the interior averages three
        assert_eq!(out, vec![[15], [30], [60], [75]]);
    }

    #[test]
    fn test_single_pass_spreads_a_spike() {
        let pool = pool();
        let mut buffer = PixelBuffer::new(5, 1, PixelFormat::Rgb24);
        buffer.set(2, 0, &[90, 90, 90]);
        blur_horizontal(&pool, &mut buffer, 3).unwrap();
        assert_eq!(buffer.get(1, 0), &[30, 30, 30]);
        assert_eq!(buffer.get(2, 0), &[30, 30, 30]);
        assert_eq!(buffer.get(3, 0), &[30, 30, 30]);
        assert_eq!(buffer.get(0, 0), &[0, 0, 0]);
    }

    #[test]
    fn test_single_vertical_pass_spreads_a_spike() {
        let pool = pool();
        let mut column = PixelBuffer::new(1, 5, PixelFormat::Rgb24);
        column.set(0, 2, &[90, 90, 90]);
        blur_vertical(&pool, &mut column, 3).unwrap();
        assert_eq!(column.get(0, 1), &[30, 30, 30]);
        assert_eq!(column.get(0, 4), &[0, 0, 0]);
    }

    #[test]
    fn test_wrong_path_is_rejected() {
        let pool = pool();
        let mut rgb = PixelBuffer::new(4, 4, PixelFormat::Rgb24);
        assert!(matches!(
            blur_horizontal_alpha(&pool, &mut rgb, 3),
            Err(GfxError::InvalidOperation { .. })
        ));
        assert!(matches!(
            blur_vertical_alpha(&pool, &mut rgb, 3),
            Err(GfxError::InvalidOperation { .. })
        ));

        let mut argb = PixelBuffer::new(4, 4, PixelFormat::Argb32);
        assert!(matches!(
            blur_horizontal(&pool, &mut argb, 3),
            Err(GfxError::InvalidOperation { .. })
        ));
        assert!(matches!(
            blur_vertical(&pool, &mut argb, 3),
            Err(GfxError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn test_rgb32_padding_untouched() {
        let pool = pool();
        let mut buffer = gradient(6, 6, PixelFormat::Rgb32);
        buffer.set(0, 0, &[10, 20, 30, 0x42]);
        box_blur_with(&pool, &mut buffer, 3).unwrap();
        assert_eq!(buffer.get(0, 0)[3], 0x42);
    }

    #[test]
    fn test_blur_respects_clip() {
        let pool = pool();
        let mut buffer = gradient(10, 10, PixelFormat::Argb32);
        let original = buffer.clone();
        {
            let mut view = buffer.with_clip(Rect::new(2, 2, 4, 4));
            box_blur_with(&pool, &mut view, 3).unwrap();
        }

        for y in 0..10 {
            for x in 0..10 {
                let inside = (2..6).contains(&x) && (2..6).contains(&y);
                if !inside {
                    assert_eq!(buffer.get(x, y), original.get(x, y), "({}, {})", x, y);
                }
            }
        }
        assert_ne!(buffer, original);
    }

    #[test]
    fn test_alpha_channel_is_blurred() {
        let pool = pool();
        let mut buffer = PixelBuffer::new(3, 1, PixelFormat::Argb32);
        buffer.set(1, 0, &[255, 0, 0, 0]);
        blur_horizontal_alpha(&pool, &mut buffer, 3).unwrap();
        assert_eq!(buffer.get(0, 0)[0], 127);
        assert_eq!(buffer.get(1, 0)[0], 85);
    }

    #[test]
    fn test_full_blur_of_a_spike() {
        let pool = pool();
        let mut buffer = PixelBuffer::new(5, 5, PixelFormat::Rgb24);
        buffer.set_color_at(2, 2, Color::from_rgb(243, 243, 243));
        box_blur_with(&pool, &mut buffer, 3).unwrap();

        // Two rounds of horizontal then vertical, each truncated at the edges
        let expected: [[u8; 5]; 5] = [
            [6, 9, 13, 9, 6],
            [8, 12, 18, 12, 8],
            [13, 18, 27, 18, 13],
            [8, 12, 18, 12, 8],
            [6, 9, 13, 9, 6],
        ];
        for (y, row) in expected.iter().enumerate() {
            for (x, &v) in row.iter().enumerate() {
                assert_eq!(buffer.get(x as u32, y as u32), &[v, v, v], "({}, {})", x, y);
            }
        }
    }
}
