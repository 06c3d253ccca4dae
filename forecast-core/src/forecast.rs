//! Forecast document lookup across the candidate URLs a point advertises.

use reqwest_middleware::ClientWithMiddleware;
use serde_json::{Number, Value};
use std::time::Duration;
use tracing::debug;

use crate::{
    error::{ForecastError, Result},
    model::{LocationMetadata, NormalizedForecast},
};

/// One candidate that did not produce a forecast.
#[derive(Debug)]
pub struct CandidateFailure {
    pub url: String,
    pub error: ForecastError,
}

/// Forecast URLs in the order they should be tried, without duplicates.
pub fn candidate_urls(metadata: &LocationMetadata, prefer_hourly: bool) -> Vec<String> {
    let ordered = if prefer_hourly {
        [metadata.forecast_hourly(), metadata.forecast()]
    } else {
        [metadata.forecast(), metadata.forecast_hourly()]
    };

    let mut urls: Vec<String> = Vec::with_capacity(3);
    for url in ordered
        .into_iter()
        .chain(std::iter::once(metadata.forecast_grid_data()))
        .flatten()
    {
        if !urls.iter().any(|seen| seen == url) {
            urls.push(url.to_string());
        }
    }
    urls
}

/// Fetch the first usable forecast among the point's candidate URLs.
///
/// A failing candidate is recorded and the next one tried. The first
/// candidate that answers with a JSON document ends the search, even when
/// that document has no periods.
pub async fn fetch_forecast(
    http: &ClientWithMiddleware,
    metadata: &LocationMetadata,
    prefer_hourly: bool,
    timeout: Duration,
) -> Result<NormalizedForecast> {
    let candidates = candidate_urls(metadata, prefer_hourly);
    if candidates.is_empty() {
        return Err(ForecastError::ForecastNotFound(format!(
            "forecast URL not found; available properties: {}",
            metadata.available_keys().join(", ")
        )));
    }

    let mut failures: Vec<CandidateFailure> = Vec::new();
    for url in &candidates {
        debug!(%url, "trying forecast URL");
        match fetch_candidate(http, url, timeout).await {
            Ok(forecast) => return Ok(forecast),
            Err(error) => {
                debug!(%url, %error, "forecast candidate failed, trying next");
                failures.push(CandidateFailure {
                    url: url.clone(),
                    error,
                });
            }
        }
    }

    let attempted = failures.iter().map(|f| f.url.clone()).collect();
    match failures.pop() {
        Some(last) => Err(ForecastError::all_endpoints_failed(attempted, last.error)),
        // Unreachable with a non-empty candidate list.
        None => Err(ForecastError::ForecastNotFound(
            "forecast URL not found".to_string(),
        )),
    }
}

async fn fetch_candidate(
    http: &ClientWithMiddleware,
    url: &str,
    timeout: Duration,
) -> Result<NormalizedForecast> {
    let res = http.get(url).timeout(timeout).send().await?;

    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(ForecastError::http(status, url, &body));
    }

    let document: Value = serde_json::from_str(&body).map_err(|e| {
        ForecastError::MalformedResponse(format!("forecast document from {url} is not JSON: {e}"))
    })?;

    Ok(normalize(document))
}

/// Flatten the first period of `document`, keeping the document itself.
pub fn normalize(document: Value) -> NormalizedForecast {
    let Some(period) = periods(&document).and_then(|p| p.first()).cloned() else {
        return NormalizedForecast::empty(document);
    };

    let text = |key: &str| period.get(key).and_then(Value::as_str).map(str::to_string);

    NormalizedForecast {
        name: text("name"),
        start_time: text("startTime"),
        temperature: period.get("temperature").and_then(temperature_value),
        unit: text("temperatureUnit"),
        short: text("shortForecast"),
        detailed: text("detailedForecast"),
        source_document: document,
    }
}

/// `properties.periods` when non-empty, else top-level `periods`.
fn periods(document: &Value) -> Option<&Vec<Value>> {
    let nested = document
        .get("properties")
        .and_then(|p| p.get("periods"))
        .and_then(Value::as_array)
        .filter(|p| !p.is_empty());

    nested.or_else(|| document.get("periods").and_then(Value::as_array))
}

/// Plain number, or a quantitative value such as `{"value": 21.1, "unitCode": ...}`.
/// The number is kept as the provider wrote it, so `75` stays an integer.
fn temperature_value(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::Object(q) => match q.get("value") {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        },
        _ => None,
    }
}
