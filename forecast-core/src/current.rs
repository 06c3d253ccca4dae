//! Legacy single-call provider: current conditions from OpenWeather.

use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{ForecastError, Result};

pub const OPENWEATHER_CURRENT_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct CurrentConditionsClient {
    http: ClientWithMiddleware,
    endpoint: String,
    api_key: String,
}

impl CurrentConditionsClient {
    pub fn new(http: ClientWithMiddleware, endpoint: impl Into<String>, api_key: String) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            api_key,
        }
    }

    /// Current conditions for `city`, returned exactly as the provider sent them.
    pub async fn current(&self, city: &str, timeout: Duration) -> Result<Value> {
        let city = city.trim();
        if city.is_empty() {
            return Err(ForecastError::InvalidInput("city must be provided".to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ForecastError::InvalidInput(
                "an OpenWeather API key is required".to_string(),
            ));
        }

        debug!(endpoint = %self.endpoint, %city, "requesting current conditions");

        let res = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .timeout(timeout)
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            // The URL carries the API key; report the bare endpoint.
            return Err(ForecastError::http(status, self.endpoint.as_str(), &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            ForecastError::MalformedResponse(format!("current conditions are not JSON: {e}"))
        })
    }
}

/// `(temperature °C, description)` from an OpenWeather current-conditions body.
pub fn summarize(current: &Value) -> Option<(f64, &str)> {
    let temp = current.pointer("/main/temp").and_then(Value::as_f64)?;
    let description = current
        .pointer("/weather/0/description")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    Some((temp, description))
}
