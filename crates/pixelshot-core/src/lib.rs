//! Core systems for Pixelshot.
//!
//! This crate provides the shared runtime pieces the image engines build on:
//!
//! - **Thread Pool**: a bounded rayon pool used for row/column fan-out
//! - **Errors**: core error types
//! - **Logging**: tracing targets and a performance span guard
//!
//! # Example
//!
//! ```
//! use pixelshot_core::{ThreadPool, ThreadPoolConfig};
//!
//! let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
//! assert_eq!(pool.execute(|| 6 * 7), 42);
//! ```

pub mod error;
pub mod logging;
pub mod threadpool;

pub use error::{CoreError, Result, ThreadPoolError};
pub use logging::PerfSpan;
pub use threadpool::{DEFAULT_PARALLELISM, ThreadPool, ThreadPoolConfig};

// Used by the exported logging macros.
#[doc(hidden)]
pub use tracing;
