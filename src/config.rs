use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl FromStr for CacheBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            other => Err(anyhow::anyhow!(
                "CACHE_BACKEND must be 'redis' or 'memory', got '{}'",
                other
            )),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub openweather_api_key: String,
    pub openweather_base_url: String,
    pub openweather_current_path: String,
    pub openweather_forecast_path: String,
    pub openweather_units: String,
    pub upstream_timeout_secs: u64,
    pub cache_backend: CacheBackend,
    pub redis_url: String,
    pub redis_max_connections: usize,
    pub cache_ttl_secs: u64,
    pub app_timezone: String,
    pub static_dir: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let config = Config {
            openweather_api_key: env::var("OPENWEATHER_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENWEATHER_API_KEY not set"))?,
            openweather_base_url: env::var("OPENWEATHER_BASE_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
            openweather_current_path: env::var("OPENWEATHER_CURRENT_PATH")
                .unwrap_or_else(|_| "/data/2.5/weather".to_string()),
            openweather_forecast_path: env::var("OPENWEATHER_FORECAST_PATH")
                .unwrap_or_else(|_| "/data/2.5/forecast".to_string()),
            openweather_units: env::var("OPENWEATHER_UNITS")
                .unwrap_or_else(|_| "metric".to_string()),
            upstream_timeout_secs: parse_var("UPSTREAM_TIMEOUT_SECS", 10)?,
            cache_backend: parse_var("CACHE_BACKEND", CacheBackend::Redis)?,
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| {
                let host = env::var("REDIS_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
                let port = env::var("REDIS_PORT").unwrap_or_else(|_| "6379".to_string());
                format!("redis://{}:{}", host, port)
            }),
            redis_max_connections: parse_var("REDIS_MAX_CONNECTIONS", 16)?,
            cache_ttl_secs: parse_var("CACHE_TTL_SECS", 600)?,
            app_timezone: env::var("APP_TIMEZONE")
                .unwrap_or_else(|_| "Asia/Kolkata".to_string()),
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            port: parse_var("PORT", 8080)?,
        };

        config.timezone()?;
        if config.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be greater than zero");
        }
        if config.redis_max_connections == 0 {
            anyhow::bail!("REDIS_MAX_CONNECTIONS must be greater than zero");
        }
        if config.cache_ttl_secs == 0 {
            anyhow::bail!("CACHE_TTL_SECS must be greater than zero");
        }

        Ok(config)
    }

    /// The reference timezone that defines "today" for hourly synthesis.
    pub fn timezone(&self) -> anyhow::Result<chrono_tz::Tz> {
        parse_timezone(&self.app_timezone)
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            openweather_api_key: "test-key".to_string(),
            openweather_base_url: "http://127.0.0.1:9".to_string(),
            openweather_current_path: "/data/2.5/weather".to_string(),
            openweather_forecast_path: "/data/2.5/forecast".to_string(),
            openweather_units: "metric".to_string(),
            upstream_timeout_secs: 10,
            cache_backend: CacheBackend::Memory,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            redis_max_connections: 16,
            cache_ttl_secs: 600,
            app_timezone: "Asia/Kolkata".to_string(),
            static_dir: "public".to_string(),
            port: 8080,
        }
    }
}

pub fn parse_timezone(tz_str: &str) -> anyhow::Result<chrono_tz::Tz> {
    tz_str
        .parse::<chrono_tz::Tz>()
        .map_err(|_| anyhow::anyhow!("Invalid timezone: {}", tz_str))
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
