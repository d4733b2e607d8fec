use super::openweather::{OpenWeatherError, WeatherProvider};
use super::types::*;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic stand-in for OpenWeather. Knows a fixed set of cities and
/// answers everything else with the upstream's "city not found".
pub struct MockWeatherProvider {
    start: DateTime<Utc>,
    samples: i64,
    current_calls: AtomicUsize,
    forecast_calls: AtomicUsize,
}

impl MockWeatherProvider {
    /// Forecast samples start at `start` and step every three hours for five
    /// days, like the real endpoint.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            samples: 40,
            current_calls: AtomicUsize::new(0),
            forecast_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_samples(mut self, samples: i64) -> Self {
        self.samples = samples;
        self
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn forecast_calls(&self) -> usize {
        self.forecast_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.current_calls() + self.forecast_calls()
    }

    fn lookup(city: &str) -> Result<(&'static str, &'static str, f64), OpenWeatherError> {
        match city.trim().to_lowercase().as_str() {
            "london" => Ok(("London", "GB", 11.56)),
            "bangkok" => Ok(("Bangkok", "TH", 31.2)),
            "kolkata" => Ok(("Kolkata", "IN", 27.8)),
            _ => Err(OpenWeatherError::NotFound("city not found".to_string())),
        }
    }
}

#[async_trait]
impl WeatherProvider for MockWeatherProvider {
    async fn current(&self, city: &str) -> Result<CurrentResponse, OpenWeatherError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let (name, country, temp) = Self::lookup(city)?;

        Ok(CurrentResponse {
            name: name.to_string(),
            sys: CurrentSys {
                country: country.to_string(),
            },
            main: CurrentMain {
                temp,
                humidity: 81.0,
                pressure: 1012.0,
            },
            wind: CurrentWind { speed: 4.63 },
            weather: vec![WeatherDescriptor {
                main: "Clouds".to_string(),
                description: "overcast clouds".to_string(),
                icon: "04d".to_string(),
            }],
        })
    }

    async fn forecast(&self, city: &str) -> Result<Forecast3hResponse, OpenWeatherError> {
        self.forecast_calls.fetch_add(1, Ordering::SeqCst);
        let (_, _, base_temp) = Self::lookup(city)?;

        let list = (0..self.samples)
            .map(|step| {
                // Diurnal swing over an eight-sample day
                let temp = base_temp + 4.0 * (step as f64 * std::f64::consts::PI / 4.0).sin();
                let (main, icon) = if step % 8 == 4 {
                    ("Rain", "10d")
                } else {
                    ("Clouds", "04d")
                };

                Forecast3hItem {
                    dt: (self.start + Duration::hours(3 * step)).timestamp(),
                    main: Forecast3hMain { temp },
                    weather: vec![WeatherDescriptor {
                        main: main.to_string(),
                        description: String::new(),
                        icon: icon.to_string(),
                    }],
                }
            })
            .collect();

        Ok(Forecast3hResponse { list })
    }
}
