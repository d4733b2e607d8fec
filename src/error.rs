use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::forecast::openweather::OpenWeatherError;

/// Failures of one `/weather` request. Cache failures never appear here:
/// the pipeline logs them and carries on.
#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("City is required")]
    CityRequired,
    #[error("{0}")]
    InvalidQuery(String),
    #[error("{0}")]
    UpstreamNotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Unexpected upstream payload: {0}")]
    UpstreamProtocol(String),
}

impl WeatherError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            WeatherError::CityRequired | WeatherError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            WeatherError::UpstreamNotFound(_)
            | WeatherError::Upstream(_)
            | WeatherError::UpstreamProtocol(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<OpenWeatherError> for WeatherError {
    fn from(err: OpenWeatherError) -> Self {
        match err {
            OpenWeatherError::NotFound(message) => WeatherError::UpstreamNotFound(message),
            OpenWeatherError::JsonParsing(e) => WeatherError::UpstreamProtocol(e.to_string()),
            OpenWeatherError::Timeout => {
                WeatherError::Upstream("Weather service timed out".to_string())
            }
            OpenWeatherError::RequestFailed(e) => {
                tracing::debug!(error = %e, "Upstream transport failure");
                WeatherError::Upstream("Weather service unavailable".to_string())
            }
            OpenWeatherError::ApiError(message) => WeatherError::Upstream(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for WeatherError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
