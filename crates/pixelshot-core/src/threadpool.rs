//! Bounded worker pool for data-parallel pixel work.
//!
//! Provides a pool built on rayon with work-stealing scheduling. Image engines
//! fan out over independent rows or columns inside [`ThreadPool::execute`],
//! which returns only after every unit of work has finished. That return is
//! the barrier between dependent passes.
//!
//! # Example
//!
//! ```
//! use pixelshot_core::threadpool::{ThreadPool, ThreadPoolConfig};
//! use rayon::prelude::*;
//!
//! let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
//! let mut rows = vec![0u8; 16];
//!
//! pool.execute(|| {
//!     rows.par_chunks_mut(4).enumerate().for_each(|(y, row)| {
//!         row.fill(y as u8);
//!     });
//! });
//!
//! assert_eq!(&rows[12..], &[3, 3, 3, 3]);
//! ```
//!
//! # Global Pool
//!
//! ```no_run
//! use pixelshot_core::threadpool::{ThreadPool, ThreadPoolConfig};
//!
//! // Optional: configure before first use, otherwise defaults apply.
//! ThreadPool::init_global(ThreadPoolConfig::with_threads(8)).unwrap();
//! let pool = ThreadPool::global();
//! assert_eq!(pool.num_threads(), 8);
//! ```

use std::sync::OnceLock;

use rayon::{ThreadPool as RayonThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::error::{CoreError, ThreadPoolError};
use crate::logging::targets;

/// Global thread pool instance.
static GLOBAL_POOL: OnceLock<ThreadPool> = OnceLock::new();

/// Default degree of parallelism for pixel work.
pub const DEFAULT_PARALLELISM: usize = 4;

/// Configuration for creating a worker pool.
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of worker threads. `None` means use the number of CPU cores.
    pub num_threads: Option<usize>,
    /// Name prefix for worker threads.
    pub thread_name: String,
    /// Stack size for worker threads in bytes.
    pub stack_size: Option<usize>,
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            num_threads: Some(DEFAULT_PARALLELISM),
            thread_name: "pixelshot-worker".to_string(),
            stack_size: None,
        }
    }
}

impl ThreadPoolConfig {
    /// Create a new configuration with custom thread count.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: Some(num_threads),
            ..Default::default()
        }
    }

    /// Use one worker per CPU core instead of the bounded default.
    pub fn unbounded() -> Self {
        Self {
            num_threads: None,
            ..Default::default()
        }
    }

    /// Set the worker thread name prefix.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set the worker stack size in bytes.
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

/// A worker pool for executing data-parallel pixel work.
pub struct ThreadPool {
    pool: RayonThreadPool,
}

impl ThreadPool {
    /// Get the global thread pool instance.
    ///
    /// The global pool is lazily initialized with default settings
    /// ([`DEFAULT_PARALLELISM`] workers).
    pub fn global() -> &'static ThreadPool {
        GLOBAL_POOL.get_or_init(|| {
            ThreadPool::new(ThreadPoolConfig::default())
                .expect("Failed to create global thread pool")
        })
    }

    /// Initialize the global thread pool with custom configuration.
    ///
    /// This must be called before any other use of the global pool.
    /// Returns an error if the pool has already been initialized.
    pub fn init_global(config: ThreadPoolConfig) -> Result<&'static ThreadPool, CoreError> {
        let pool = ThreadPool::new(config)?;
        GLOBAL_POOL
            .set(pool)
            .map_err(|_| ThreadPoolError::AlreadyInitialized)?;
        GLOBAL_POOL
            .get()
            .ok_or_else(|| ThreadPoolError::AlreadyInitialized.into())
    }

    /// Create a new thread pool with the given configuration.
    pub fn new(config: ThreadPoolConfig) -> Result<Self, CoreError> {
        let name = config.thread_name.clone();
        let mut builder =
            ThreadPoolBuilder::new().thread_name(move |index| format!("{}-{}", name, index));

        if let Some(num_threads) = config.num_threads {
            builder = builder.num_threads(num_threads);
        }

        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let pool = builder
            .build()
            .map_err(|e| ThreadPoolError::CreationFailed(e.to_string()))?;

        info!(
            target: targets::CORE,
            threads = pool.current_num_threads(),
            name = %config.thread_name,
            "created worker pool"
        );

        Ok(Self { pool })
    }

    /// Get the number of threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Execute a closure on the pool and block until completion.
    ///
    /// Parallel iterators used inside the closure run on this pool's workers.
    pub fn execute<F, T>(&self, task: F) -> T
    where
        F: FnOnce() -> T + Send,
        T: Send,
    {
        self.pool.install(task)
    }

    /// Scope for executing multiple tasks that can borrow from the enclosing scope.
    ///
    /// All tasks spawned within the scope must complete before the scope exits.
    pub fn scope<'scope, F, T>(&self, f: F) -> T
    where
        F: FnOnce(&rayon::Scope<'scope>) -> T + Send,
        T: Send,
    {
        self.pool.scope(f)
    }
}

impl std::fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadPool")
            .field("num_threads", &self.num_threads())
            .finish()
    }
}

static_assertions::assert_impl_all!(ThreadPool: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[test]
    fn test_default_config_is_bounded() {
        let config = ThreadPoolConfig::default();
        assert_eq!(config.num_threads, Some(DEFAULT_PARALLELISM));
        assert_eq!(config.thread_name, "pixelshot-worker");
        assert!(ThreadPoolConfig::unbounded().num_threads.is_none());
    }

    #[test]
    fn test_config_builders() {
        let config = ThreadPoolConfig::with_threads(3)
            .with_thread_name("blur")
            .with_stack_size(1 << 20);
        assert_eq!(config.num_threads, Some(3));
        assert_eq!(config.thread_name, "blur");
        assert_eq!(config.stack_size, Some(1 << 20));
    }

    #[test]
    fn test_num_threads() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
        assert_eq!(pool.num_threads(), 2);
    }

    #[test]
    fn test_execute_sync() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
        let result = pool.execute(|| 42);
        assert_eq!(result, 42);
    }

    #[test]
    fn test_execute_parallel_rows() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(4)).unwrap();
        let mut data = vec![0u32; 64 * 8];

        pool.execute(|| {
            data.par_chunks_mut(8).enumerate().for_each(|(row, cells)| {
                for cell in cells.iter_mut() {
                    *cell = row as u32;
                }
            });
        });

        // Every row has been written once execute returns
        for (row, cells) in data.chunks(8).enumerate() {
            assert!(cells.iter().all(|&c| c == row as u32));
        }
    }

    #[test]
    fn test_scope() {
        let pool = ThreadPool::new(ThreadPoolConfig::with_threads(2)).unwrap();
        let data = vec![1, 2, 3, 4, 5];
        let sum = AtomicI32::new(0);

        pool.scope(|s| {
            for &value in &data {
                let sum_ref = &sum;
                s.spawn(move |_| {
                    sum_ref.fetch_add(value, Ordering::SeqCst);
                });
            }
        });

        assert_eq!(sum.load(Ordering::SeqCst), 15);
    }

    #[test]
    fn test_global_pool_is_shared() {
        let a = ThreadPool::global() as *const ThreadPool;
        let b = ThreadPool::global() as *const ThreadPool;
        assert_eq!(a, b);
        assert!(matches!(
            ThreadPool::init_global(ThreadPoolConfig::default()),
            Err(CoreError::ThreadPool(ThreadPoolError::AlreadyInitialized))
        ));
    }
}
