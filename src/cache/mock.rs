//! Mock cache store for testing.

use super::{CacheError, CacheResult, CacheStore, MemoryStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Wraps a [`MemoryStore`], counts every operation, records the TTL of each
/// write, and can be told to fail reads or writes.
#[derive(Default)]
pub struct MockStore {
    inner: MemoryStore,
    gets: AtomicUsize,
    sets: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: Mutex<Vec<(String, Duration)>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_reads(self) -> Self {
        self.fail_reads.store(true, Ordering::SeqCst);
        self
    }

    pub fn failing_writes(self) -> Self {
        self.fail_writes.store(true, Ordering::SeqCst);
        self
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Keys and TTLs of the writes that reached the store.
    pub fn writes(&self) -> Vec<(String, Duration)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// Reads straight from the backing store without counting.
    pub async fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.get(key).await.ok().flatten()
    }

    /// Seeds the backing store without counting.
    pub async fn seed(&self, key: &str, value: &[u8]) {
        self.inner
            .set_with_expiry(key, value, Duration::from_secs(600))
            .await
            .ok();
    }
}

#[async_trait]
impl CacheStore for MockStore {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Connection("connection refused".to_string()));
        }
        self.inner.get(key).await
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Command(format!("SET {} failed: READONLY", key)));
        }
        if let Ok(mut writes) = self.writes.lock() {
            writes.push((key.to_string(), ttl));
        }
        self.inner.set_with_expiry(key, value, ttl).await
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}
