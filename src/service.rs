//! The cache-through pipeline behind `GET /weather`.
//!
//! ```text
//! lookup ──hit──────────────────────────────────────────────▶ respond
//!    └─miss─▶ fetch current + forecast ─ok─▶ normalize ─▶ store ─▶ respond
//!                                      └─err────────────────────▶ error
//! ```
//!
//! Concurrent misses for the same city are not coalesced; each one fetches
//! upstream and the last write wins.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    cache::{cache_key, CacheStore},
    error::WeatherError,
    forecast::{normalize::normalize, openweather::WeatherProvider, types::WeatherResult},
};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct WeatherService {
    store: Arc<dyn CacheStore>,
    provider: Arc<dyn WeatherProvider>,
    ttl: Duration,
    timezone: Tz,
    clock: Clock,
}

impl WeatherService {
    pub fn new(
        store: Arc<dyn CacheStore>,
        provider: Arc<dyn WeatherProvider>,
        ttl: Duration,
        timezone: Tz,
    ) -> Self {
        Self {
            store,
            provider,
            ttl,
            timezone,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock, so "today" can be pinned in tests.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn get_weather(&self, city: &str) -> Result<WeatherResult, WeatherError> {
        let city = city.trim();
        if city.is_empty() {
            return Err(WeatherError::CityRequired);
        }

        let key = cache_key(city);

        if let Some(cached) = self.lookup(&key).await {
            tracing::info!(city, key = %key, "Cache HIT");
            return Ok(cached);
        }

        tracing::info!(city, key = %key, "Cache MISS, fetching from upstream");
        let result = self.fetch_and_normalize(city).await?;
        self.populate(&key, &result).await;

        Ok(result)
    }

    /// Any store failure or undecodable entry reads as a miss.
    async fn lookup(&self, key: &str) -> Option<WeatherResult> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(result) => Some(result),
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => {
                tracing::debug!(key, "Key not present in cache");
                None
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    async fn fetch_and_normalize(&self, city: &str) -> Result<WeatherResult, WeatherError> {
        let (current, forecast) =
            tokio::try_join!(self.provider.current(city), self.provider.forecast(city))
                .map_err(|e| {
                    tracing::error!(city, error = %e, "Upstream request failed");
                    WeatherError::from(e)
                })?;

        let now = (self.clock)();
        normalize(&current, &forecast, now, self.timezone).map_err(|e| {
            tracing::error!(city, error = %e, "Upstream payload rejected");
            e
        })
    }

    /// Write failures are logged and swallowed; the caller still gets the
    /// fresh result.
    async fn populate(&self, key: &str, result: &WeatherResult) {
        let bytes = match serde_json::to_vec(result) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not serialize result for cache");
                return;
            }
        };

        match self.store.set_with_expiry(key, &bytes, self.ttl).await {
            Ok(()) => tracing::info!(key, ttl_secs = self.ttl.as_secs(), "Stored result in cache"),
            Err(e) => tracing::warn!(key, error = %e, "Cache write failed"),
        }
    }
}
