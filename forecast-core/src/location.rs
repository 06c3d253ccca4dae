use reqwest_middleware::ClientWithMiddleware;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{Level, debug, enabled};

use crate::{
    error::{ForecastError, Result},
    model::{Coordinate, LocationMetadata},
};

pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// Look up provider metadata for `coord` at `{base}/points/{lat},{lon}`.
pub async fn resolve_location(
    http: &ClientWithMiddleware,
    base: &str,
    coord: Coordinate,
    timeout: Duration,
) -> Result<LocationMetadata> {
    let points_url = format!("{}/points/{coord}", base.trim_end_matches('/'));
    debug!(url = %points_url, "requesting point metadata");

    let res = http.get(&points_url).timeout(timeout).send().await?;

    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        debug!(%status, %body, "points error response");
        return Err(ForecastError::http(status, points_url, &body));
    }

    // A 2xx body that is not JSON is treated as "no properties" so the
    // coverage error below is the one the caller sees.
    let points = match serde_json::from_str::<Value>(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, %body, "points response was not JSON");
            Value::Null
        }
    };

    if enabled!(Level::DEBUG) {
        debug!(%points, "full points response");
    }

    let metadata = LocationMetadata::new(extract_properties(points));
    debug!(keys = ?metadata.available_keys(), "points properties");

    if metadata.is_empty() {
        return Err(ForecastError::ForecastNotFound(format!(
            "no properties in points response for {coord} (likely outside coverage)"
        )));
    }

    Ok(metadata)
}

/// `properties` if it is an object, otherwise the body itself.
fn extract_properties(points: Value) -> Map<String, Value> {
    match points {
        Value::Object(mut body) => match body.remove("properties") {
            Some(Value::Object(props)) => props,
            Some(other) => {
                body.insert("properties".to_string(), other);
                body
            }
            None => body,
        },
        _ => Map::new(),
    }
}
