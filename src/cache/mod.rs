//! Key-value store holding normalized weather snapshots.
//!
//! The pipeline only needs `get` and `set_with_expiry`; anything that can
//! expire entries on its own satisfies [`CacheStore`]. Two backends ship with
//! the server: [`RedisStore`] for deployments and [`MemoryStore`] for local
//! runs without Redis.

mod error;
mod memory;
#[cfg(test)]
mod mock;
mod redis_store;

pub use error::{CacheError, CacheResult};
pub use memory::MemoryStore;
#[cfg(test)]
pub use mock::MockStore;
pub use redis_store::{RedisStore, RedisStoreConfig};

use async_trait::async_trait;
use std::time::Duration;

pub const KEY_PREFIX: &str = "weather:";

/// A key-value store with per-entry expiry.
///
/// Values are opaque bytes; callers own serialization. Stores are shared
/// across request tasks, so implementations must be `Send + Sync`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns `Ok(None)` when the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous entry, and expires it
    /// after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()>;

    /// Releases backend resources. Later operations fail with
    /// [`CacheError::Closed`].
    async fn close(&self);
}

/// Cache key for a city: trimmed, lowercased and prefixed.
pub fn cache_key(city: &str) -> String {
    format!("{}{}", KEY_PREFIX, city.trim().to_lowercase())
}
