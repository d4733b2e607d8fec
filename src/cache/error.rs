//! Cache error types.

use thiserror::Error;

/// Errors that can occur while talking to the cache store.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Failed to connect to the cache backend.
    #[error("Cache connection failed: {0}")]
    Connection(String),

    /// A command reached the backend but did not succeed.
    #[error("Cache command failed: {0}")]
    Command(String),

    /// The store has been closed and no longer accepts operations.
    #[error("Cache store is closed")]
    Closed,
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
