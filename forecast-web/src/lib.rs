//! `GET /api/weather` over the forecast pipeline.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use forecast_core::{
    Coordinate, ForecastError, ForecastOptions, ForecastPipeline, LocationQuery, NormalizedForecast,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<ForecastPipeline>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub city: Option<String>,
}

/// A 400 with `{"error": message}`.
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": self.0 }))).into_response()
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        ApiError(err.to_string())
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/weather", get(weather))
        .layer(cors)
        .with_state(state)
}

async fn weather(
    State(state): State<AppState>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<NormalizedForecast>, ApiError> {
    let query = location_query(params)?;
    tracing::debug!(?query, "weather request");

    let forecast = state
        .pipeline
        .get_forecast(&query, ForecastOptions::default())
        .await
        .map_err(|err| {
            tracing::info!(error = %err, "forecast lookup failed");
            ApiError::from(err)
        })?;

    Ok(Json(forecast))
}

/// Either both of `lat`/`lon`, or `city`. Blank values count as absent.
fn location_query(params: WeatherParams) -> Result<LocationQuery, ApiError> {
    let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

    match (present(params.lat), present(params.lon), present(params.city)) {
        (Some(_), None, _) | (None, Some(_), _) => {
            Err(ApiError("Provide both lat and lon".to_string()))
        }
        (Some(_), Some(_), Some(_)) => Err(ApiError(
            "Provide either lat/lon or city, not both".to_string(),
        )),
        (Some(lat), Some(lon), None) => {
            let (Ok(lat), Ok(lon)) = (lat.trim().parse::<f64>(), lon.trim().parse::<f64>()) else {
                return Err(ApiError("Invalid lat/lon format".to_string()));
            };
            let coord = Coordinate::new(lat, lon)
                .map_err(|_| ApiError("Invalid lat/lon format".to_string()))?;
            Ok(LocationQuery::Coordinates(coord))
        }
        (None, None, Some(city)) => Ok(LocationQuery::Place(city)),
        (None, None, None) => Err(ApiError("Provide either lat/lon or city".to_string())),
    }
}
