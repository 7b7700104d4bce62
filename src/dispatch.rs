//! Steps shared by the async and blocking dispatchers, so both follow the
//! same retry and classification rules.

use crate::classify;
use crate::error::{Error, Result};
use crate::request::RequestDescriptor;
use crate::settings::Endpoints;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub(crate) const USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// What to do with a response.
#[derive(Debug)]
pub(crate) enum Step {
    Decode,
    /// Refresh the token and send again
    Refresh,
    Fail(Error),
}

/// `refreshed` is true when the request was already resent with a new token.
pub(crate) fn next_step(status: StatusCode, method: Method, url: &Url, refreshed: bool) -> Step {
    if status.is_success() {
        Step::Decode
    } else if status == StatusCode::UNAUTHORIZED && !refreshed {
        Step::Refresh
    } else {
        Step::Fail(classify::status_error(status, method, url.clone()))
    }
}

pub(crate) fn resource_url(endpoints: &Endpoints, request: &RequestDescriptor) -> Result<Url> {
    let base = request.region().api_base(endpoints);
    let mut url = Url::parse(&format!("{}{}", base, request.resource())).map_err(|err| {
        Error::Configuration(format!("invalid api url '{}{}': {}", base, request.resource(), err))
    })?;

    if !request.query().is_empty() {
        url.query_pairs_mut().extend_pairs(request.query().iter());
    }
    Ok(url)
}

pub(crate) fn decode_body(body: &[u8], url: &Url) -> Result<Value> {
    serde_json::from_slice(body).map_err(|err| classify::decode_error(err, url.clone()))
}

pub(crate) fn decode_document<R>(document: &Value, url: &Url) -> Result<R>
where
    R: DeserializeOwned,
{
    <R as serde::Deserialize>::deserialize(document)
        .map_err(|err| classify::decode_error(err, url.clone()))
}
