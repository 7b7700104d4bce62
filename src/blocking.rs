//! Blocking counterpart of [`crate::Client`], with the same token lifecycle,
//! retry and error rules.
//!
//! Like `reqwest::blocking`, it must not be used from inside an async runtime.

use crate::classify;
use crate::clock::{Clock, SystemClock};
use crate::dispatch::{self, Step, USER_AGENT};
use crate::error::Result;
use crate::memo::Memoizer;
use crate::region::Region;
use crate::request::RequestDescriptor;
use crate::settings::Settings;
use crate::token::{BlockingTokenManager, Token};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

pub struct Client {
    http_client: reqwest::blocking::Client,
    settings: Arc<Settings>,
    tokens: BlockingTokenManager,
    memo: Memoizer<String, Arc<Value>>,
}

impl Client {
    pub fn open(settings: Settings) -> Result<Self> {
        Self::open_with_clock(settings, Arc::new(SystemClock))
    }

    pub fn open_with_clock(settings: Settings, clock: Arc<dyn Clock>) -> Result<Self> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(classify::transport_error)?;

        let settings = Arc::new(settings);
        trace!("Opened blocking client for '{}'", settings.client_id);

        Ok(Client {
            tokens: BlockingTokenManager::new(http_client.clone(), Arc::clone(&settings), clock),
            memo: Memoizer::new(&settings.cache),
            http_client,
            settings,
        })
    }

    pub fn get<R>(&self, resource: &str, region: &str, query: &[(&str, &str)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let region = Region::resolve(region)?;
        let request = RequestDescriptor::new(resource, region).params(query.iter().copied());
        self.get_json(&request)
    }

    pub fn get_json<R>(&self, request: &RequestDescriptor) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = dispatch::resource_url(&self.settings.endpoints, request)?;
        let document = self.document(request)?;
        dispatch::decode_document(&document, &url)
    }

    pub fn document(&self, request: &RequestDescriptor) -> Result<Arc<Value>> {
        self.memo.memoize(request.cache_key(), || {
            self.dispatch(request).map(Arc::new)
        })
    }

    pub fn dispatch(&self, request: &RequestDescriptor) -> Result<Value> {
        let url = dispatch::resource_url(&self.settings.endpoints, request)?;
        let region = request.region();

        let mut token = self.tokens.ensure_valid_token(region)?;
        let mut refreshed = false;

        loop {
            let response = self.send(&url, &token)?;
            let status = response.status();
            trace!("GET {} returned {}", url, status);

            match dispatch::next_step(status, request.method(), &url, refreshed) {
                Step::Decode => {
                    let body = response.bytes().map_err(classify::transport_error)?;
                    return dispatch::decode_body(&body, &url);
                }
                Step::Refresh => {
                    debug!("GET {} was unauthorized, refreshing the token once", url);
                    token = self.tokens.refresh(region, &token)?;
                    refreshed = true;
                }
                Step::Fail(err) => return Err(err),
            }
        }
    }

    fn send(&self, url: &Url, token: &Token) -> Result<reqwest::blocking::Response> {
        self.http_client
            .get(url.clone())
            .bearer_auth(token.access_token())
            .send()
            .map_err(classify::transport_error)
    }

    pub fn ensure_valid_token(&self, region: Region) -> Result<Arc<Token>> {
        self.tokens.ensure_valid_token(region)
    }

    pub fn tokens(&self) -> &BlockingTokenManager {
        &self.tokens
    }

    pub fn is_memoized(&self, request: &RequestDescriptor) -> bool {
        self.memo.contains(&request.cache_key())
    }

    pub fn close(self) {
        debug!("Closing blocking client for '{}'", self.settings.client_id);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("blocking::Client")
            .field("settings", &self.settings)
            .finish()
    }
}
