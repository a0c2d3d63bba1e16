//! Error types for the gfx crate.

use thiserror::Error;

/// Errors that can occur during image processing.
#[derive(Error, Debug)]
pub enum GfxError {
    /// An engine was invoked in a way that would corrupt the pixel layout.
    #[error("invalid operation {operation}: {reason}")]
    InvalidOperation {
        operation: &'static str,
        reason: String,
    },

    /// The pixel layout is outside the supported set.
    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(String),

    /// Negative or overflowing image dimensions.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Raw pixel data does not match the declared dimensions.
    #[error("invalid data size: expected {expected} bytes, got {actual}")]
    DataSize { expected: usize, actual: usize },

    /// Failed to decode an image at the boundary.
    #[error("failed to decode image: {0}")]
    Decode(String),
}

impl GfxError {
    pub(crate) fn invalid_operation(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            operation,
            reason: reason.into(),
        }
    }
}

/// Result type for gfx operations.
pub type GfxResult<T> = Result<T, GfxError>;
