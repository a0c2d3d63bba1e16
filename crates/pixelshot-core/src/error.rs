//! Error types for Pixelshot core systems.

use thiserror::Error;

/// The main error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Worker pool related error.
    #[error("thread pool error: {0}")]
    ThreadPool(#[from] ThreadPoolError),
}

/// Worker pool specific errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadPoolError {
    /// The underlying rayon pool could not be built.
    #[error("failed to create thread pool: {0}")]
    CreationFailed(String),

    /// The global pool was already initialized.
    #[error("global thread pool has already been initialized")]
    AlreadyInitialized,
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_error_converts() {
        let err: CoreError = ThreadPoolError::AlreadyInitialized.into();
        assert!(matches!(
            err,
            CoreError::ThreadPool(ThreadPoolError::AlreadyInitialized)
        ));
        assert_eq!(
            err.to_string(),
            "thread pool error: global thread pool has already been initialized"
        );
    }
}
