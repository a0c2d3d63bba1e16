//! Arbitrary-size resampling through the `image` crate.
//!
//! Integer upscaling of pixel art goes through [`crate::scale`]; everything
//! else (thumbnails, percentage scaling, fit-to-box) lands here.

use pixelshot_core::{PerfSpan, gfx_debug};

use crate::pixel_buffer::PixelBuffer;

/// Resampling filter for resize operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeFilter {
    /// Nearest neighbor interpolation. Keeps hard pixel edges.
    Nearest,
    /// Bilinear interpolation.
    Triangle,
    /// Catmull-Rom bicubic interpolation.
    #[default]
    CatmullRom,
    /// Gaussian interpolation. Smooth results.
    Gaussian,
    /// Lanczos interpolation with window size 3.
    Lanczos3,
}

impl ResizeFilter {
    fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            ResizeFilter::Nearest => image::imageops::FilterType::Nearest,
            ResizeFilter::Triangle => image::imageops::FilterType::Triangle,
            ResizeFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResizeFilter::Gaussian => image::imageops::FilterType::Gaussian,
            ResizeFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Resample to exactly `width` x `height`, keeping the source format.
///
/// A zero target dimension or an empty source yields a zeroed buffer of the
/// requested size.
pub fn resample(source: &PixelBuffer, width: u32, height: u32, filter: ResizeFilter) -> PixelBuffer {
    if source.is_empty() || width == 0 || height == 0 {
        return PixelBuffer::new(width, height, source.format());
    }
    if source.dimensions() == (width, height) {
        return source.clone();
    }

    let _span = PerfSpan::new("resample");
    gfx_debug!(
        from = ?source.dimensions(),
        to = ?(width, height),
        filter = ?filter,
        "resample"
    );

    let rgba = source.to_rgba_image();
    let resized = image::imageops::resize(&rgba, width, height, filter.to_image_filter());
    PixelBuffer::from_rgba_image(&resized, source.format())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel_buffer::PixelFormat;
    use crate::types::Color;

    #[test]
    fn test_resample_exact_size() {
        let source = PixelBuffer::filled(7, 3, PixelFormat::Argb32, Color::RED);
        for filter in [
            ResizeFilter::Nearest,
            ResizeFilter::Triangle,
            ResizeFilter::CatmullRom,
            ResizeFilter::Gaussian,
            ResizeFilter::Lanczos3,
        ] {
            let resized = resample(&source, 20, 9, filter);
            assert_eq!(resized.dimensions(), (20, 9));
            assert_eq!(resized.format(), PixelFormat::Argb32);
        }
    }

    #[test]
    fn test_nearest_keeps_colors() {
        let mut source = PixelBuffer::filled(2, 1, PixelFormat::Rgb24, Color::WHITE);
        source.set_color_at(0, 0, Color::BLACK);
        let resized = resample(&source, 4, 2, ResizeFilter::Nearest);
        assert_eq!(resized.color_at(0, 1), Color::BLACK);
        assert_eq!(resized.color_at(1, 0), Color::BLACK);
        assert_eq!(resized.color_at(3, 1), Color::WHITE);
    }

    #[test]
    fn test_degenerate_targets() {
        let source = PixelBuffer::filled(4, 4, PixelFormat::Argb32, Color::BLUE);
        assert_eq!(resample(&source, 0, 5, ResizeFilter::Triangle).dimensions(), (0, 5));
        let empty = PixelBuffer::new(0, 0, PixelFormat::Argb32);
        assert_eq!(resample(&empty, 3, 3, ResizeFilter::Triangle).dimensions(), (3, 3));
    }
}
