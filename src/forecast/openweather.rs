use super::types::*;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenWeatherError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Weather service timed out")]
    Timeout,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    ApiError(String),
}

/// Source of the two payloads the normalizer consumes.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<CurrentResponse, OpenWeatherError>;

    async fn forecast(&self, city: &str) -> Result<Forecast3hResponse, OpenWeatherError>;
}

pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    current_path: String,
    forecast_path: String,
    units: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(config: &Config) -> Result<Self, OpenWeatherError> {
        let client = Client::builder()
            .user_agent("WeatherCacheProxy/1.0")
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.openweather_base_url.trim_end_matches('/').to_string(),
            current_path: config.openweather_current_path.clone(),
            forecast_path: config.openweather_forecast_path.clone(),
            units: config.openweather_units.clone(),
            api_key: config.openweather_api_key.clone(),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str, city: &str) -> Result<T, OpenWeatherError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", city),
                ("units", self.units.as_str()),
                ("appid", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(classify_transport_error)?;

        // Error bodies are usually JSON with a message, but proxies in front
        // of the API may answer with anything.
        let json: Value = match serde_json::from_str(&text) {
            Ok(json) => json,
            Err(e) if status.is_success() => return Err(OpenWeatherError::JsonParsing(e)),
            Err(_) => return Err(status_error(status, None, &text)),
        };

        let envelope: StatusEnvelope = serde_json::from_value(json.clone()).unwrap_or_default();
        let reported = envelope
            .cod
            .and_then(|code| StatusCode::from_u16(code).ok())
            .unwrap_or(status);

        if !status.is_success() || !reported.is_success() {
            let effective = if status.is_success() { reported } else { status };
            return Err(status_error(effective, envelope.message, &text));
        }

        Ok(serde_json::from_value(json)?)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn current(&self, city: &str) -> Result<CurrentResponse, OpenWeatherError> {
        tracing::debug!(city, "Requesting current conditions");
        self.fetch(&self.current_path, city).await
    }

    async fn forecast(&self, city: &str) -> Result<Forecast3hResponse, OpenWeatherError> {
        tracing::debug!(city, "Requesting 3-hour forecast");
        self.fetch(&self.forecast_path, city).await
    }
}

// The request URL carries `appid`, so it is dropped before the error can
// reach a log line or a response body.
fn classify_transport_error(err: reqwest::Error) -> OpenWeatherError {
    if err.is_timeout() {
        OpenWeatherError::Timeout
    } else {
        OpenWeatherError::RequestFailed(err.without_url())
    }
}

fn status_error(status: StatusCode, message: Option<String>, body: &str) -> OpenWeatherError {
    let message = message.unwrap_or_else(|| {
        let body = body.trim();
        if body.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {}: {}", status, body)
        }
    });

    if status == StatusCode::NOT_FOUND {
        OpenWeatherError::NotFound(message)
    } else {
        OpenWeatherError::ApiError(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        let mut config = Config::for_tests();
        config.openweather_base_url = server.uri();
        config.upstream_timeout_secs = 1;
        OpenWeatherClient::new(&config).unwrap()
    }

    fn current_body() -> Value {
        serde_json::json!({
            "coord": { "lon": -0.1257, "lat": 51.5085 },
            "weather": [{ "id": 804, "main": "Clouds", "description": "overcast clouds", "icon": "04d" }],
            "main": { "temp": 11.56, "feels_like": 10.9, "pressure": 1012, "humidity": 81 },
            "wind": { "speed": 4.63, "deg": 240 },
            "sys": { "country": "GB", "sunrise": 1762412345, "sunset": 1762445678 },
            "name": "London",
            "cod": 200
        })
    }

    #[tokio::test]
    async fn test_current_sends_city_units_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "london"))
            .and(query_param("units", "metric"))
            .and(query_param("appid", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let current = client_for(&server).current("london").await.unwrap();

        assert_eq!(current.name, "London");
        assert_eq!(current.sys.country, "GB");
        assert_eq!(current.weather[0].icon, "04d");
    }

    #[tokio::test]
    async fn test_forecast_accepts_string_status_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "200",
                "message": 0,
                "cnt": 1,
                "list": [{
                    "dt": 1762419600,
                    "main": { "temp": 9.4, "humidity": 80 },
                    "weather": [{ "id": 500, "main": "Rain", "description": "light rain", "icon": "10d" }],
                    "dt_txt": "2025-11-06 09:00:00"
                }],
                "city": { "name": "London", "country": "GB" }
            })))
            .mount(&server)
            .await;

        let forecast = client_for(&server).forecast("london").await.unwrap();

        assert_eq!(forecast.list.len(), 1);
        assert_eq!(forecast.list[0].weather[0].main, "Rain");
    }

    #[tokio::test]
    async fn test_unknown_city_maps_to_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).current("atlantis").await.unwrap_err();

        match err {
            OpenWeatherError::NotFound(message) => assert_eq!(message, "city not found"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_code_in_ok_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "cod": "401",
                "message": "Invalid API key"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).forecast("london").await.unwrap_err();

        assert!(matches!(err, OpenWeatherError::ApiError(ref m) if m == "Invalid API key"));
    }

    #[tokio::test]
    async fn test_non_json_error_body_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).current("london").await.unwrap_err();

        assert!(matches!(err, OpenWeatherError::ApiError(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn test_malformed_success_payload_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "cod": 200, "name": "London" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).current("london").await.unwrap_err();

        assert!(matches!(err, OpenWeatherError::JsonParsing(_)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let mut config = Config::for_tests();
        config.openweather_api_key = "SUPERSECRETKEY".to_string();
        config.openweather_base_url = "http://127.0.0.1:1".to_string();
        let client = OpenWeatherClient::new(&config).unwrap();

        let err = client.current("london").await.unwrap_err();

        assert!(matches!(err, OpenWeatherError::RequestFailed(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).current("london").await.unwrap_err();

        assert!(matches!(err, OpenWeatherError::Timeout));
    }
}
