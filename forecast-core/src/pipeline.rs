use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::{
    current::OPENWEATHER_CURRENT_URL,
    error::{ForecastError, Result},
    forecast::fetch_forecast,
    geocode::{NOMINATIM_SEARCH_URL, geocode},
    location::{NWS_API_BASE, resolve_location},
    model::{Coordinate, ForecastOptions, LocationQuery, NormalizedForecast},
    transport::{HttpSettings, build_client},
};

/// Provider endpoints, also the `[endpoints]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Whether place names may be geocoded at all.
    pub geocoding: bool,
    /// Place search URL.
    pub geocode: String,
    /// Base of the `/points/{lat},{lon}` lookup.
    pub points_base: String,
    /// Legacy current-conditions URL.
    pub current: String,
}

impl Endpoints {
    /// Place search URL, if geocoding is enabled.
    pub fn geocode_url(&self) -> Option<&str> {
        Some(self.geocode.as_str()).filter(|_| self.geocoding)
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            geocoding: true,
            geocode: NOMINATIM_SEARCH_URL.to_string(),
            points_base: NWS_API_BASE.to_string(),
            current: OPENWEATHER_CURRENT_URL.to_string(),
        }
    }
}

/// Geocode (optional) → point metadata → forecast, in sequence.
#[derive(Debug, Clone)]
pub struct ForecastPipeline {
    http: ClientWithMiddleware,
    endpoints: Endpoints,
    timeout: Duration,
}

impl ForecastPipeline {
    /// Pipeline owning a fresh client built from `settings`.
    pub fn new(settings: &HttpSettings, endpoints: Endpoints) -> Result<Self> {
        Ok(Self::with_client(
            build_client(settings)?,
            endpoints,
            settings.timeout(),
        ))
    }

    /// Pipeline sharing a caller-owned client.
    pub fn with_client(
        http: ClientWithMiddleware,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Self {
        Self {
            http,
            endpoints,
            timeout,
        }
    }

    pub fn client(&self) -> &ClientWithMiddleware {
        &self.http
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn can_geocode(&self) -> bool {
        self.endpoints.geocode_url().is_some()
    }

    pub async fn geocode(&self, place: &str, timeout: Option<Duration>) -> Result<Coordinate> {
        let endpoint = self.endpoints.geocode_url().ok_or_else(|| {
            ForecastError::InvalidInput(
                "geocoding is not configured; pass coordinates instead".to_string(),
            )
        })?;

        geocode(&self.http, endpoint, place, timeout.unwrap_or(self.timeout)).await
    }

    pub async fn get_forecast(
        &self,
        query: &LocationQuery,
        options: ForecastOptions,
    ) -> Result<NormalizedForecast> {
        let timeout = options.timeout.unwrap_or(self.timeout);

        let coord = match query {
            LocationQuery::Place(place) => self.geocode(place, Some(timeout)).await?,
            LocationQuery::Coordinates(coord) => *coord,
        };
        debug!(%coord, hourly = options.hourly, "resolving forecast");

        let metadata =
            resolve_location(&self.http, &self.endpoints.points_base, coord, timeout).await?;

        fetch_forecast(&self.http, &metadata, options.hourly, timeout).await
    }
}
