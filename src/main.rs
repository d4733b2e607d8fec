use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cache;
mod config;
mod error;
mod forecast;
mod routes;
mod service;

use cache::{CacheStore, MemoryStore, RedisStore, RedisStoreConfig};
use config::{CacheBackend, Config};
use forecast::openweather::OpenWeatherClient;
use routes::{create_router, AppState};
use service::WeatherService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_cache_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let timezone = config.timezone()?;

    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            let redis_config = RedisStoreConfig::new(config.redis_url.clone())
                .with_max_connections(config.redis_max_connections);
            Arc::new(RedisStore::connect_lazy(redis_config).await?)
        }
        CacheBackend::Memory => {
            tracing::info!("Using in-memory cache store");
            Arc::new(MemoryStore::new())
        }
    };

    let weather_client = Arc::new(OpenWeatherClient::new(&config)?);

    let service = WeatherService::new(
        store.clone(),
        weather_client,
        Duration::from_secs(config.cache_ttl_secs),
        timezone,
    );

    let state = AppState {
        weather: Arc::new(service),
    };

    let app = create_router(state, &config.static_dir)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        timezone = %timezone,
        ttl_secs = config.cache_ttl_secs,
        "Server starting on http://{}",
        addr
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
