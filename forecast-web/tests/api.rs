use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use forecast_core::{Endpoints, ForecastPipeline, HttpSettings};
use forecast_web::{AppState, router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(server: &MockServer) -> Router {
    let endpoints = Endpoints {
        geocoding: true,
        geocode: format!("{}/search", server.uri()),
        points_base: server.uri(),
        current: format!("{}/weather", server.uri()),
    };
    let settings = HttpSettings {
        max_retries: 0,
        ..HttpSettings::default()
    };
    let pipeline = ForecastPipeline::new(&settings, endpoints).unwrap();
    router(AppState {
        pipeline: Arc::new(pipeline),
    })
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn mount_forecast(server: &MockServer) {
    let forecast_url = format!("{}/gridpoints/SEW/124,67/forecast", server.uri());
    Mock::given(method("GET"))
        .and(path("/points/47.6062,-122.3321"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"properties": {"forecast": forecast_url}})),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gridpoints/SEW/124,67/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "properties": {"periods": [{
                "name": "This Afternoon",
                "temperature": 75,
                "temperatureUnit": "F",
                "shortForecast": "Partly Sunny"
            }]}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn coordinates_return_normalized_forecast() {
    let server = MockServer::start().await;
    mount_forecast(&server).await;

    let (status, body) = get(app(&server), "/api/weather?lat=47.6062&lon=-122.3321").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "This Afternoon");
    assert_eq!(body["temperature"], 75);
    assert!(body["temperature"].is_u64());
    assert_eq!(body["unit"], "F");
    assert_eq!(body["short"], "Partly Sunny");
    assert!(body["sourceDocument"]["properties"]["periods"].is_array());
}

#[tokio::test]
async fn city_is_geocoded_first() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"lat": "47.6062", "lon": "-122.3321"}])),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_forecast(&server).await;

    let (status, body) = get(app(&server), "/api/weather?city=Seattle").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["short"], "Partly Sunny");
}

#[tokio::test]
async fn partial_coordinates_are_bad_request() {
    let server = MockServer::start().await;

    let (status, body) = get(app(&server), "/api/weather?lat=47.6").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Provide both lat and lon");
}

#[tokio::test]
async fn missing_parameters_are_bad_request() {
    let server = MockServer::start().await;

    let (status, body) = get(app(&server), "/api/weather").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Provide either lat/lon or city");
}

#[tokio::test]
async fn pipeline_failure_is_bad_request_with_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let (status, body) = get(app(&server), "/api/weather?city=Atlantis").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Atlantis"));
}
