use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::{fmt, time::Duration};

use crate::error::{ForecastError, Result};

/// A latitude/longitude pair. Range is not validated; the provider decides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(ForecastError::InvalidInput(format!(
                "coordinates must be finite, got {latitude},{longitude}"
            )));
        }
        Ok(Self { latitude, longitude })
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// Provider metadata for a point: forecast URL references plus whatever
/// else the provider chose to include.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationMetadata {
    properties: Map<String, Value>,
}

impl LocationMetadata {
    pub fn new(properties: Map<String, Value>) -> Self {
        Self { properties }
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn forecast(&self) -> Option<&str> {
        self.url("forecast")
    }

    pub fn forecast_hourly(&self) -> Option<&str> {
        self.url("forecastHourly")
    }

    pub fn forecast_grid_data(&self) -> Option<&str> {
        self.url("forecastGridData")
    }

    /// Property keys in sorted order.
    pub fn available_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    fn url(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// First forecast period flattened, plus the document it came from.
///
/// All descriptive fields are `None` when the document had no periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedForecast {
    pub name: Option<String>,
    pub start_time: Option<String>,
    pub temperature: Option<Number>,
    pub unit: Option<String>,
    pub short: Option<String>,
    pub detailed: Option<String>,
    pub source_document: Value,
}

impl NormalizedForecast {
    pub fn empty(source_document: Value) -> Self {
        Self {
            name: None,
            start_time: None,
            temperature: None,
            unit: None,
            short: None,
            detailed: None,
            source_document,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.start_time.is_none()
            && self.temperature.is_none()
            && self.unit.is_none()
            && self.short.is_none()
            && self.detailed.is_none()
    }
}

/// What the caller knows about the location.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    Place(String),
    Coordinates(Coordinate),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastOptions {
    /// Try the hourly forecast before the standard one.
    pub hourly: bool,
    /// Per-request timeout for this invocation; the pipeline default otherwise.
    pub timeout: Option<Duration>,
}
