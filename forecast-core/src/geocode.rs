//! Forward geocoding: place name to coordinates.
//! Talks to a Nominatim-style search endpoint.

use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{ForecastError, Result},
    model::Coordinate,
};

pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Resolve `place` to the coordinates of its best match.
pub async fn geocode(
    http: &ClientWithMiddleware,
    endpoint: &str,
    place: &str,
    timeout: Duration,
) -> Result<Coordinate> {
    let place = place.trim();
    if place.is_empty() {
        return Err(ForecastError::InvalidInput(
            "place name must be provided for geocoding".to_string(),
        ));
    }

    debug!(%endpoint, %place, "geocoding");

    let res = http
        .get(endpoint)
        .query(&[
            ("q", place),
            ("format", "json"),
            ("limit", "1"),
            ("addressdetails", "0"),
        ])
        .timeout(timeout)
        .send()
        .await?;

    let status = res.status();
    let url = res.url().to_string();
    let body = res.text().await?;

    if !status.is_success() {
        debug!(%status, %body, "geocode request failed");
        return Err(ForecastError::http(status, url, &body));
    }

    let hits: Vec<Value> = serde_json::from_str(&body).map_err(|e| {
        ForecastError::MalformedResponse(format!("geocode response is not a JSON list: {e}"))
    })?;

    let Some(first) = hits.first() else {
        return Err(ForecastError::NotFound(format!(
            "no geocoding result for {place:?}"
        )));
    };

    let latitude = coordinate_field(first, "lat")?;
    let longitude = coordinate_field(first, "lon")?;
    debug!(latitude, longitude, "geocoded");

    Ok(Coordinate { latitude, longitude })
}

/// Nominatim sends coordinates as strings; plain numbers are accepted too.
fn coordinate_field(hit: &Value, key: &str) -> Result<f64> {
    let value = match hit.get(key) {
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };

    value.filter(|v| v.is_finite()).ok_or_else(|| {
        ForecastError::MalformedResponse(format!(
            "geocode result has missing or non-numeric {key:?}"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn coordinate_field_parses_strings_and_numbers() {
        let hit = json!({"lat": " 47.6062 ", "lon": -122.3321});
        assert_eq!(coordinate_field(&hit, "lat").unwrap(), 47.6062);
        assert_eq!(coordinate_field(&hit, "lon").unwrap(), -122.3321);
    }

    #[test]
    fn coordinate_field_rejects_garbage() {
        for hit in [
            json!({}),
            json!({"lat": null}),
            json!({"lat": "north"}),
            json!({"lat": "NaN"}),
            json!({"lat": ["1"]}),
        ] {
            let err = coordinate_field(&hit, "lat").unwrap_err();
            assert!(matches!(err, ForecastError::MalformedResponse(_)), "{hit}");
        }
    }
}
