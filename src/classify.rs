//! Maps transport failures and non-2xx statuses onto [`Error`].

use crate::error::Error;
use reqwest::{Method, StatusCode};
use std::sync::Arc;
use url::Url;

/// Error for a non-2xx status. A 401 reaching this point has already been
/// retried once with a fresh token.
pub fn status_error(status: StatusCode, method: Method, url: Url) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::Authentication {
            message: format!("{} {} was rejected after refreshing the access token", method, url),
            status: Some(status),
            url: Some(url),
            source: None,
        },
        StatusCode::NOT_FOUND => Error::ResourceNotFound { method, url },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimit { method, url },
        status => Error::Api {
            status,
            method,
            url,
        },
    }
}

pub fn transport_error(source: reqwest::Error) -> Error {
    Error::ApiConnection {
        source: Arc::new(source),
    }
}

pub fn decode_error(source: serde_json::Error, url: Url) -> Error {
    Error::InvalidResponse {
        url,
        source: Arc::new(source),
    }
}
