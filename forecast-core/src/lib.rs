//! Core library for the `weather` CLI and web endpoint.
//!
//! This crate defines:
//! - The forecast pipeline: geocode → point metadata → forecast document
//! - A shared HTTP transport with bounded retries
//! - The legacy current-conditions client
//! - Configuration & credentials handling
//!
//! Every stage depends on the previous one's output, so stages run in
//! sequence. Only the forecast fetcher recovers from failures locally, by
//! moving on to the next candidate URL.

pub mod config;
pub mod current;
pub mod error;
pub mod forecast;
pub mod geocode;
pub mod location;
pub mod model;
pub mod pipeline;
pub mod transport;

pub use config::{Config, ProviderConfig};
pub use current::CurrentConditionsClient;
pub use error::ForecastError;
pub use forecast::{CandidateFailure, candidate_urls, fetch_forecast};
pub use geocode::geocode;
pub use location::resolve_location;
pub use model::{Coordinate, ForecastOptions, LocationMetadata, LocationQuery, NormalizedForecast};
pub use pipeline::{Endpoints, ForecastPipeline};
pub use transport::{HttpSettings, build_client};
