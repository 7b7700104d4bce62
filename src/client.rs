use crate::clock::{Clock, SystemClock};
use crate::classify;
use crate::dispatch::{self, Step, USER_AGENT};
use crate::error::Result;
use crate::memo::AsyncMemoizer;
use crate::region::Region;
use crate::request::RequestDescriptor;
use crate::settings::Settings;
use crate::token::{Token, TokenManager};
use log::{debug, trace};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Async client. Calls may be interleaved freely on one instance; they share
/// its token slots and memoization table.
pub struct Client {
    http_client: reqwest::Client,
    settings: Arc<Settings>,
    tokens: TokenManager,
    memo: AsyncMemoizer<String, Arc<Value>>,
}

impl Client {
    /// Open a client. No network traffic happens until the first request.
    pub fn open(settings: Settings) -> Result<Self> {
        Self::open_with_clock(settings, Arc::new(SystemClock))
    }

    pub fn open_with_clock(settings: Settings, clock: Arc<dyn Clock>) -> Result<Self> {
        // Create the underlying http client, will be reused for every call
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().map_err(classify::transport_error)?;

        let settings = Arc::new(settings);
        trace!("Opened client for '{}'", settings.client_id);

        Ok(Client {
            tokens: TokenManager::new(http_client.clone(), Arc::clone(&settings), clock),
            memo: AsyncMemoizer::new(&settings.cache),
            http_client,
            settings,
        })
    }

    /// GET `resource` in the region named by `region` and decode the JSON
    /// body into `R`. Results are memoized per argument list.
    pub async fn get<R>(&self, resource: &str, region: &str, query: &[(&str, &str)]) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let region = Region::resolve(region)?;
        let request = RequestDescriptor::new(resource, region).params(query.iter().copied());
        self.get_json(&request).await
    }

    /// Memoized, typed variant of [`Client::dispatch`].
    pub async fn get_json<R>(&self, request: &RequestDescriptor) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = dispatch::resource_url(&self.settings.endpoints, request)?;
        let document = self.document(request).await?;
        dispatch::decode_document(&document, &url)
    }

    /// Memoized [`Client::dispatch`]. Failures are not remembered.
    pub async fn document(&self, request: &RequestDescriptor) -> Result<Arc<Value>> {
        self.memo
            .memoize(request.cache_key(), || async {
                self.dispatch(request).await.map(Arc::new)
            })
            .await
    }

    /// Send `request` without consulting the memoization table.
    pub async fn dispatch(&self, request: &RequestDescriptor) -> Result<Value> {
        let url = dispatch::resource_url(&self.settings.endpoints, request)?;
        let region = request.region();

        // Ensure we don't attempt to make a request with an expired access token
        let mut token = self.tokens.ensure_valid_token(region).await?;
        let mut refreshed = false;

        loop {
            let response = self.send(&url, &token).await?;
            let status = response.status();
            trace!("GET {} returned {}", url, status);

            match dispatch::next_step(status, request.method(), &url, refreshed) {
                Step::Decode => {
                    let body = response.bytes().await.map_err(classify::transport_error)?;
                    return dispatch::decode_body(&body, &url);
                }
                Step::Refresh => {
                    debug!("GET {} was unauthorized, refreshing the token once", url);
                    token = self.tokens.refresh(region, &token).await?;
                    refreshed = true;
                }
                Step::Fail(err) => return Err(err),
            }
        }
    }

    async fn send(&self, url: &Url, token: &Token) -> Result<reqwest::Response> {
        self.http_client
            .get(url.clone())
            .bearer_auth(token.access_token())
            .send()
            .await
            .map_err(classify::transport_error)
    }

    pub async fn ensure_valid_token(&self, region: Region) -> Result<Arc<Token>> {
        self.tokens.ensure_valid_token(region).await
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn is_memoized(&self, request: &RequestDescriptor) -> bool {
        self.memo.contains(&request.cache_key())
    }

    /// Release the connection pool. Cached tokens and memoized documents go
    /// with the client.
    pub fn close(self) {
        debug!("Closing client for '{}'", self.settings.client_id);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("settings", &self.settings)
            .finish()
    }
}

