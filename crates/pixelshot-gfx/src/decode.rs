//! Decoding encoded images into [`PixelBuffer`]s.
//!
//! Decoders are looked up by file extension in a [`DecoderRegistry`] built by
//! the caller. The empty extension holds the fallback decoder.

use std::collections::HashMap;

use pixelshot_core::{gfx_debug, gfx_warn};

use crate::error::{GfxError, GfxResult};
use crate::pixel_buffer::{PixelBuffer, PixelFormat};

/// A function turning encoded bytes into a buffer.
pub type DecodeFn = fn(&[u8]) -> GfxResult<PixelBuffer>;

/// Decode with the `image` crate, sniffing the container format.
///
/// The result is always [`PixelFormat::Argb32`].
pub fn decode_with_image_crate(bytes: &[u8]) -> GfxResult<PixelBuffer> {
    let image = image::load_from_memory(bytes).map_err(|e| GfxError::Decode(e.to_string()))?;
    Ok(PixelBuffer::from_rgba_image(&image.to_rgba8(), PixelFormat::Argb32))
}

/// Extension to decoder table.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl DecoderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the `image` crate decoder for common formats and as
    /// the fallback.
    pub fn with_defaults() -> Self {
        ["", "png", "bmp", "gif", "jpg", "jpeg", "ico"]
            .into_iter()
            .fold(Self::new(), |registry, ext| {
                registry.with_decoder(ext, decode_with_image_crate)
            })
    }

    /// Register a decoder for an extension, replacing any previous one.
    pub fn with_decoder(mut self, extension: &str, decoder: DecodeFn) -> Self {
        self.decoders.insert(normalize(extension), decoder);
        self
    }

    /// The decoder registered for an extension.
    pub fn get(&self, extension: &str) -> Option<DecodeFn> {
        self.decoders.get(&normalize(extension)).copied()
    }

    /// Whether a decoder is registered for an extension.
    pub fn supports(&self, extension: &str) -> bool {
        self.decoders.contains_key(&normalize(extension))
    }

    /// Decode bytes, picking the decoder by extension.
    ///
    /// Unknown extensions and failures of a specific decoder fall back to
    /// the decoder registered for the empty extension.
    pub fn decode(&self, bytes: &[u8], extension: Option<&str>) -> GfxResult<PixelBuffer> {
        let extension = extension.map(normalize).unwrap_or_default();
        let fallback = self.decoders.get("");

        let Some(decoder) = self.decoders.get(&extension) else {
            gfx_debug!(extension = %extension, "no decoder registered, using fallback");
            return match fallback {
                Some(decode) => decode(bytes),
                None => Err(GfxError::UnsupportedFormat(format!("no decoder for '{}'", extension))),
            };
        };

        match decoder(bytes) {
            Ok(buffer) => Ok(buffer),
            Err(err) if !extension.is_empty() => {
                let Some(decode) = fallback else {
                    return Err(err);
                };
                gfx_warn!(extension = %extension, error = %err, "decoder failed, retrying with fallback");
                decode(bytes)
            }
            Err(err) => Err(err),
        }
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes() -> Vec<u8> {
        let mut image = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 255, 255]));
        image.put_pixel(1, 1, Rgba([255, 0, 0, 128]));
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png).unwrap();
        bytes
    }

    fn failing(_: &[u8]) -> GfxResult<PixelBuffer> {
        Err(GfxError::Decode("always fails".into()))
    }

    #[test]
    fn test_default_decoders() {
        let registry = DecoderRegistry::with_defaults();
        for ext in ["png", ".PNG", "jpeg", "ico", ""] {
            assert!(registry.supports(ext), "{}", ext);
        }
        assert!(!registry.supports("svg"));
    }

    #[test]
    fn test_decode_png() {
        let registry = DecoderRegistry::with_defaults();
        let buffer = registry.decode(&png_bytes(), Some("png")).unwrap();
        assert_eq!(buffer.dimensions(), (3, 2));
        assert_eq!(buffer.format(), PixelFormat::Argb32);
        assert_eq!(buffer.color_at(0, 0), Color::BLUE);
        assert_eq!(buffer.color_at(1, 1), Color::from_argb(128, 255, 0, 0));
    }

    #[test]
    fn test_unknown_extension_uses_fallback() {
        let registry = DecoderRegistry::with_defaults();
        assert!(registry.decode(&png_bytes(), Some("tmp")).is_ok());
        assert!(registry.decode(&png_bytes(), None).is_ok());
    }

    #[test]
    fn test_failing_decoder_falls_back() {
        let registry = DecoderRegistry::with_defaults().with_decoder("png", failing);
        assert!(registry.decode(&png_bytes(), Some("png")).is_ok());

        let strict = DecoderRegistry::new().with_decoder("png", failing);
        assert!(matches!(
            strict.decode(&png_bytes(), Some("png")),
            Err(GfxError::Decode(_))
        ));
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let registry = DecoderRegistry::with_defaults();
        assert!(matches!(
            registry.decode(b"not an image", Some("png")),
            Err(GfxError::Decode(_))
        ));
        assert!(matches!(
            DecoderRegistry::new().decode(b"", Some("png")),
            Err(GfxError::UnsupportedFormat(_))
        ));
    }
}
