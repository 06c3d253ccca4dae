//! Shared HTTP client with bounded retries on transient statuses.

use async_trait::async_trait;
use http::Extensions;
use reqwest::{
    Method, Request, Response, StatusCode,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use reqwest_retry::{
    RetryTransientMiddleware, Retryable, RetryableStrategy, default_on_request_failure,
    policies::ExponentialBackoff,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;

pub const DEFAULT_USER_AGENT: &str = concat!("forecast-core/", env!("CARGO_PKG_VERSION"));
pub const ACCEPT_TYPES: &str = "application/ld+json, application/json";

/// Statuses worth another attempt.
pub const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

const MAX_BACKOFF: Duration = Duration::from_secs(120);

/// Client settings, also the `[http]` table of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub user_agent: String,
    pub max_retries: u32,
    /// Seconds; first retry waits this long, then doubles.
    pub backoff_factor: f64,
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: 3,
            backoff_factor: 0.5,
            timeout_secs: 5,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn min_backoff(&self) -> Duration {
        Duration::try_from_secs_f64(self.backoff_factor.max(0.0))
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

/// Build the client every component shares.
pub fn build_client(settings: &HttpSettings) -> Result<ClientWithMiddleware> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_TYPES));

    let inner = reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(headers)
        .build()?;

    let policy = ExponentialBackoff::builder()
        .retry_bounds(settings.min_backoff(), MAX_BACKOFF)
        .build_with_max_retries(settings.max_retries);

    let retry = RetryTransientMiddleware::new_with_policy_and_strategy(policy, TransientStatuses);

    Ok(ClientBuilder::new(inner).with(GetOnly(retry)).build())
}

/// Retries on [`RETRY_STATUSES`]; request failures use the library default.
#[derive(Debug, Clone, Copy)]
pub struct TransientStatuses;

impl RetryableStrategy for TransientStatuses {
    fn handle(
        &self,
        res: &std::result::Result<Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if RETRY_STATUSES.contains(&response.status()) => {
                tracing::debug!(
                    status = %response.status(),
                    url = %response.url(),
                    "transient status, retrying"
                );
                Some(Retryable::Transient)
            }
            Ok(_) => None,
            Err(error) => default_on_request_failure(error),
        }
    }
}

/// Applies the wrapped middleware to GET requests only.
#[derive(Debug)]
pub struct GetOnly<M>(pub M);

#[async_trait]
impl<M: Middleware> Middleware for GetOnly<M> {
    async fn handle(
        &self,
        req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        if req.method() == Method::GET {
            self.0.handle(req, extensions, next).await
        } else {
            next.run(req, extensions).await
        }
    }
}
