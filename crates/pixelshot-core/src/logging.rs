//! Logging facilities for Pixelshot.
//!
//! Pixelshot uses the `tracing` crate for instrumentation. The libraries never
//! install a subscriber; to see logs, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Every engine entry point opens a [`PerfSpan`] so the duration of blur,
//! scale and crop work shows up under the [`targets::PERF`] target.

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core systems target.
    pub const CORE: &str = "pixelshot_core";
    /// Image processing target.
    pub const GFX: &str = "pixelshot_gfx";
    /// Performance spans.
    pub const PERF: &str = "pixelshot::perf";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// This is useful for tracking the duration of operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "pixelshot::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` crate macros with consistent
/// target naming.
#[macro_export]
macro_rules! gfx_debug {
    ($($arg:tt)*) => {
        $crate::tracing::debug!(target: "pixelshot_gfx", $($arg)*)
    };
}

#[macro_export]
macro_rules! gfx_warn {
    ($($arg:tt)*) => {
        $crate::tracing::warn!(target: "pixelshot_gfx", $($arg)*)
    };
}
