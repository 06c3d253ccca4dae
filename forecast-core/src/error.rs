use thiserror::Error;

pub use reqwest::StatusCode;

/// Errors produced by the forecast pipeline.
///
/// The core never formats these for a human; callers map kinds to exit
/// codes or HTTP statuses.
#[derive(Debug, Error)]
pub enum ForecastError {
    /// A caller-supplied argument failed a precondition. No request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A well-formed query had no match.
    #[error("not found: {0}")]
    NotFound(String),

    /// A response arrived but could not be interpreted.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// A single endpoint answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: StatusCode,
        url: String,
        body: String,
    },

    /// Coordinates resolved, but the provider has no forecast for them.
    #[error("forecast not found: {0}")]
    ForecastNotFound(String),

    /// Every candidate forecast URL failed. `source()` is the last
    /// candidate's [`ForecastError`].
    #[error("all forecast endpoints failed for this point (tried {})", .attempted.join(", "))]
    AllEndpointsFailed {
        attempted: Vec<String>,
        #[source]
        last: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Connection, timeout or other transport-level failure.
    #[error("network error: {0}")]
    Network(#[from] reqwest_middleware::Error),
}

impl From<reqwest::Error> for ForecastError {
    fn from(err: reqwest::Error) -> Self {
        ForecastError::Network(reqwest_middleware::Error::Reqwest(err))
    }
}

impl ForecastError {
    pub fn http(status: StatusCode, url: impl Into<String>, body: &str) -> Self {
        ForecastError::Http {
            status,
            url: url.into(),
            body: truncate_body(body),
        }
    }

    pub fn all_endpoints_failed(attempted: Vec<String>, last: ForecastError) -> Self {
        ForecastError::AllEndpointsFailed {
            attempted,
            last: Box::new(last),
        }
    }

    /// The failure of the last candidate tried, for [`ForecastError::AllEndpointsFailed`].
    pub fn last_failure(&self) -> Option<&ForecastError> {
        match self {
            ForecastError::AllEndpointsFailed { last, .. } => last.downcast_ref(),
            _ => None,
        }
    }

    /// HTTP status carried by this error, if it is an [`ForecastError::Http`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ForecastError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = ForecastError> = std::result::Result<T, E>;

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}
