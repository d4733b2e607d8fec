//! Redis-backed cache store.
//!
//! Connections come from a `deadpool-redis` pool. Entries are written with
//! `SET key value EX ttl`, so expiry is handled by Redis itself.

use super::{CacheError, CacheResult, CacheStore};
use async_trait::async_trait;
use deadpool_redis::{Config as PoolConfig, Pool, Runtime};
use redis::AsyncCommands;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Configuration for the Redis store.
#[derive(Debug, Clone)]
pub struct RedisStoreConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379").
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: usize,
}

impl RedisStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 16,
        }
    }

    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self::new("redis://127.0.0.1:6379")
    }
}

pub struct RedisStore {
    pool: Pool,
    url: String,
    closed: AtomicBool,
}

impl RedisStore {
    /// Builds the pool and checks the server answers `PING`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the pool cannot be built or Redis is
    /// unreachable.
    pub async fn connect(config: RedisStoreConfig) -> CacheResult<Self> {
        let store = Self::build(config)?;
        store.ping().await?;

        tracing::info!(url = %store.url, "Connected to Redis");
        Ok(store)
    }

    /// Builds the pool without requiring Redis to be up yet.
    ///
    /// A failed `PING` is only logged. Pooled connections are opened on
    /// demand, so the store recovers once Redis becomes reachable and every
    /// operation before that fails with `CacheError::Connection`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` if the URL or pool settings are invalid.
    pub async fn connect_lazy(config: RedisStoreConfig) -> CacheResult<Self> {
        let store = Self::build(config)?;

        match store.ping().await {
            Ok(()) => tracing::info!(url = %store.url, "Connected to Redis"),
            Err(e) => tracing::warn!(
                url = %store.url,
                error = %e,
                "Redis unreachable at startup, serving without cache until it recovers"
            ),
        }

        Ok(store)
    }

    fn build(config: RedisStoreConfig) -> CacheResult<Self> {
        let pool = PoolConfig::from_url(&config.url)
            .builder()
            .map_err(|e| CacheError::Connection(format!("Failed to create pool config: {}", e)))?
            .max_size(config.max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| CacheError::Connection(format!("Failed to build pool: {}", e)))?;

        Ok(Self {
            pool,
            url: config.url,
            closed: AtomicBool::new(false),
        })
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut *conn)
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;
        Ok(())
    }

    async fn get_conn(&self) -> CacheResult<deadpool_redis::Connection> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to get connection: {}", e)))
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("url", &self.url)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let mut conn = self.get_conn().await?;

        let value: Option<Vec<u8>> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Command(format!("GET {} failed: {}", key, e)))?;

        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        let mut conn = self.get_conn().await?;
        // EX rejects zero, so sub-second TTLs round up to one second
        let ttl_secs = ttl.as_secs().max(1);

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_secs)
            .query_async::<()>(&mut *conn)
            .await
            .map_err(|e| CacheError::Command(format!("SET {} failed: {}", key, e)))?;

        Ok(())
    }

    async fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.pool.close();
            tracing::info!(url = %self.url, "Redis connection pool closed");
        }
    }
}
