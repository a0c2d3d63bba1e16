//! Composable image effects.
//!
//! An [`Effect`] turns one image into another and reports geometry changes
//! through a [`Transform2D`]. Effects that have nothing to do return `None`
//! and are skipped by [`apply_effects`].

use pixelshot_core::gfx_debug;

use crate::composite::{ResizeOptions, create_monochrome, resize};
use crate::error::GfxResult;
use crate::pixel_buffer::PixelBuffer;
use crate::transform::Transform2D;

/// An image effect.
pub trait Effect: Send + Sync + std::fmt::Debug {
    /// Apply the effect, returning the new image or `None` for no change.
    fn apply(&self, image: &PixelBuffer, transform: &mut Transform2D) -> GfxResult<Option<PixelBuffer>>;

    /// Restore the default parameters, if the effect has any.
    fn reset(&mut self);
}

/// Black and white thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonochromeEffect {
    /// Mean brightness below which a pixel turns black. Lower means less black.
    pub threshold: u8,
}

impl MonochromeEffect {
    pub fn new(threshold: u8) -> Self {
        Self { threshold }
    }
}

impl Effect for MonochromeEffect {
    fn apply(&self, image: &PixelBuffer, _transform: &mut Transform2D) -> GfxResult<Option<PixelBuffer>> {
        Ok(Some(create_monochrome(image, self.threshold)))
    }

    fn reset(&mut self) {}
}

/// Resize to a fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeEffect {
    pub width: i32,
    pub height: i32,
    pub maintain_aspect_ratio: bool,
}

impl ResizeEffect {
    pub fn new(width: i32, height: i32, maintain_aspect_ratio: bool) -> Self {
        Self {
            width,
            height,
            maintain_aspect_ratio,
        }
    }
}

impl Effect for ResizeEffect {
    fn apply(&self, image: &PixelBuffer, transform: &mut Transform2D) -> GfxResult<Option<PixelBuffer>> {
        let options =
            ResizeOptions::new(self.width, self.height).with_aspect_ratio(self.maintain_aspect_ratio);
        resize(image, &options, Some(transform)).map(Some)
    }

    fn reset(&mut self) {}
}

/// Apply a single effect.
pub fn apply_effect(
    source: &PixelBuffer,
    effect: &dyn Effect,
    transform: &mut Transform2D,
) -> GfxResult<Option<PixelBuffer>> {
    gfx_debug!(effect = ?effect, "apply effect");
    effect.apply(source, transform)
}

/// Apply effects in order, each to the output of the previous one.
///
/// Returns a copy of `source` when no effect produced an image.
pub fn apply_effects(
    source: &PixelBuffer,
    effects: &[&dyn Effect],
    transform: &mut Transform2D,
) -> GfxResult<PixelBuffer> {
    let mut current: Option<PixelBuffer> = None;
    for effect in effects {
        let input = current.as_ref().unwrap_or(source);
        if let Some(output) = apply_effect(input, *effect, transform)? {
            current = Some(output);
        }
    }
    Ok(current.unwrap_or_else(|| source.clone()))
}
