use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::services::ServeDir;

use crate::{error::WeatherError, forecast::types::WeatherResult, service::WeatherService};

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub weather: Arc<WeatherService>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_weather(
    State(state): State<AppState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Json<WeatherResult>, WeatherError> {
    let Query(params) =
        query.map_err(|rejection| WeatherError::InvalidQuery(rejection.body_text()))?;
    let city = params.city.unwrap_or_default();
    let result = state.weather.get_weather(&city).await?;
    Ok(Json(result))
}

// Create the router. Anything that is not an API route falls through to the
// static frontend.
pub fn create_router(state: AppState, static_dir: &str) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/weather", get(get_weather))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}
