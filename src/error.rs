use reqwest::{Method, StatusCode};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Cause of an [`Error`], shared so errors can be cloned.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure the client reports to its callers. Cloning is cheap, concurrent
/// identical calls that were coalesced all receive the same error.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The authorization server refused to issue a token, or the API kept
    /// rejecting requests after a token refresh.
    #[error("authentication failed: {message}")]
    Authentication {
        message: String,
        status: Option<StatusCode>,
        url: Option<Url>,
        #[source]
        source: Option<SharedError>,
    },

    #[error("API rate limit exceeded for {method} {url}, wait before making more requests")]
    RateLimit { method: Method, url: Url },

    #[error("resource not found: {method} {url}")]
    ResourceNotFound { method: Method, url: Url },

    #[error("invalid region: '{0}', must be one of: 'us', 'eu', 'kr', 'tw' or 'cn'")]
    InvalidRegion(String),

    #[error("error connecting to API: {source}")]
    ApiConnection {
        #[source]
        source: Arc<reqwest::Error>,
    },

    #[error("invalid JSON response received from {url}: {source}")]
    InvalidResponse {
        url: Url,
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// Any other non-2xx status
    #[error("HTTP error {status} for {method} {url}")]
    Api {
        status: StatusCode,
        method: Method,
        url: Url,
    },

    #[error("invalid configuration: {0}")]
    Configuration(String),
}

/// Flat classification of [`Error`], handy for matching without destructuring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Authentication,
    RateLimit,
    ResourceNotFound,
    InvalidRegion,
    ApiConnection,
    InvalidResponse,
    Api,
    Configuration,
}

impl Error {
    pub(crate) fn authentication(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Authentication {
            message: message.into(),
            status: None,
            url: None,
            source: Some(Arc::from(source.into())),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication { .. } => ErrorKind::Authentication,
            Error::RateLimit { .. } => ErrorKind::RateLimit,
            Error::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Error::InvalidRegion(_) => ErrorKind::InvalidRegion,
            Error::ApiConnection { .. } => ErrorKind::ApiConnection,
            Error::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            Error::Api { .. } => ErrorKind::Api,
            Error::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// HTTP status that produced this error, if one was received.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Authentication { status, .. } => *status,
            Error::RateLimit { .. } => Some(StatusCode::TOO_MANY_REQUESTS),
            Error::ResourceNotFound { .. } => Some(StatusCode::NOT_FOUND),
            Error::Api { status, .. } => Some(*status),
            Error::ApiConnection { source } => source.status(),
            _ => None,
        }
    }

    /// URL of the request that produced this error, if one was sent.
    pub fn url(&self) -> Option<&Url> {
        match self {
            Error::Authentication { url, .. } => url.as_ref(),
            Error::RateLimit { url, .. }
            | Error::ResourceNotFound { url, .. }
            | Error::InvalidResponse { url, .. }
            | Error::Api { url, .. } => Some(url),
            Error::ApiConnection { source } => source.url(),
            _ => None,
        }
    }
}
