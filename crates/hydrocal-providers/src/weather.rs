//! OpenWeatherMap client.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use hydrocal_core::WeatherProvider;

use crate::error::{ProviderError, Result};

/// Current-weather endpoint, metric units.
const API_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// OpenWeatherMap current-temperature client.
pub struct OpenWeather {
    api_key: String,
    http: reqwest::Client,
}

impl OpenWeather {
    pub fn new(api_key: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            api_key: api_key.into(),
            http,
        }
    }

    /// Fetch the current temperature in °C for a city.
    async fn fetch(&self, city: &str) -> Result<f64> {
        debug!(city, "fetching current temperature");

        let response: Value = self
            .http
            .get(API_URL)
            .query(&[
                ("q", city),
                ("appid", &self.api_key),
                ("units", "metric"),
            ])
            .send()
            .await?
            .json()
            .await?;

        // OpenWeather reports errors as { "cod": "404", "message": ... }.
        let cod = response
            .get("cod")
            .map(|v| v.as_i64().unwrap_or_else(|| {
                v.as_str().and_then(|s| s.parse().ok()).unwrap_or(-1)
            }))
            .unwrap_or(-1);
        if cod != 200 {
            let message = response
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            return Err(ProviderError::Api {
                service: "openweathermap",
                reason: format!("code {cod}: {message}"),
            });
        }

        response
            .pointer("/main/temp")
            .and_then(|v| v.as_f64())
            .ok_or(ProviderError::BadResponse {
                service: "openweathermap",
                reason: "missing main.temp".to_string(),
            })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeather {
    async fn temperature(&self, city: &str) -> Option<f64> {
        match self.fetch(city).await {
            Ok(temp) => Some(temp),
            Err(err) => {
                warn!(city, %err, "weather lookup failed");
                None
            }
        }
    }
}
