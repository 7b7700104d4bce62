use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::region::Region;
use crate::settings::Settings;
use log::{debug, trace};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse, BasicTokenType};
use oauth2::{
    AuthUrl, ClientCredentialsTokenRequest, ClientId, ClientSecret, HttpRequest, HttpResponse, Scope,
    TokenResponse, TokenUrl,
};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// A token is only handed out while it outlives `now` by at least this margin.
pub const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(60);

type Slot = Option<Arc<Token>>;

const REGIONS: usize = Region::ALL.len();

/// An issued bearer token. Never mutated, a refresh swaps in a new one.
#[derive(Clone)]
pub struct Token {
    access_token: String,
    token_type: String,
    expires_in: Duration,
    expires_at: Instant,
}

impl Token {
    pub fn new(
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_in: Duration,
        issued_at: Instant,
    ) -> Result<Self> {
        let expires_at = issued_at.checked_add(expires_in).ok_or_else(|| {
            token_rejected("expires_in was so long it caused an overflow")
        })?;

        Ok(Token {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expires_in,
            expires_at,
        })
    }

    fn from_response(response: &BasicTokenResponse, issued_at: Instant) -> Result<Self> {
        let expires_in = response
            .expires_in()
            .ok_or_else(|| token_rejected("expires_in is missing in token response"))?;

        let token_type: &str = response.token_type().as_ref();
        Token::new(
            response.access_token().secret().to_owned(),
            token_type,
            expires_in,
            issued_at,
        )
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: Instant) -> bool {
        self.expires_at > now + TOKEN_EXPIRY_SKEW
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

fn token_rejected(message: &str) -> Error {
    Error::Authentication {
        message: message.to_string(),
        status: None,
        url: None,
        source: None,
    }
}

fn valid_token(slot: &Slot, now: Instant) -> Option<Arc<Token>> {
    slot.as_ref().filter(|token| token.is_valid_at(now)).cloned()
}

/// A valid token that already replaced `rejected`, i.e. a concurrent caller
/// refreshed while we were waiting for the lock.
fn superseding_token(slot: &Slot, rejected: &Arc<Token>, now: Instant) -> Option<Arc<Token>> {
    valid_token(slot, now).filter(|current| !Arc::ptr_eq(current, rejected))
}

fn oauth_client(settings: &Settings, token_url: &str) -> Result<BasicClient> {
    let invalid_url = |err: oauth2::url::ParseError| {
        Error::Configuration(format!("invalid token url '{}': {}", token_url, err))
    };

    Ok(BasicClient::new(
        ClientId::new(settings.client_id.clone()),
        Some(ClientSecret::new(settings.client_secret.clone())),
        AuthUrl::new("http://unused".to_string()).map_err(invalid_url)?,
        Some(TokenUrl::new(token_url.to_string()).map_err(invalid_url)?),
    ))
}

fn credentials_request<'a>(
    client: &'a BasicClient,
    scopes: &[String],
) -> ClientCredentialsTokenRequest<'a, BasicErrorResponse, BasicTokenResponse, BasicTokenType> {
    let mut request = client.exchange_client_credentials();
    for scope in scopes.iter().cloned() {
        request = request.add_scope(Scope::new(scope));
    }
    request
}

fn fetch_failed(token_url: &str, err: impl Into<crate::error::BoxError>) -> Error {
    Error::authentication(
        format!("failed to fetch client credentials token from {}", token_url),
        err,
    )
}

/// Send an oauth2 token request over the client's own connection pool, so the
/// configured timeout applies to token requests too.
async fn exchange(
    http_client: &reqwest::Client,
    request: HttpRequest,
) -> std::result::Result<HttpResponse, reqwest::Error> {
    let mut builder = http_client
        .request(request.method, request.url.as_str())
        .body(request.body);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send().await?;
    let status_code = response.status();
    let headers = response.headers().to_owned();
    let body = response.bytes().await?;

    Ok(HttpResponse {
        status_code,
        headers,
        body: body.to_vec(),
    })
}

fn exchange_blocking(
    http_client: &reqwest::blocking::Client,
    request: HttpRequest,
) -> std::result::Result<HttpResponse, reqwest::Error> {
    let mut builder = http_client
        .request(request.method, request.url.as_str())
        .body(request.body);
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_bytes());
    }

    let response = builder.send()?;
    let status_code = response.status();
    let headers = response.headers().to_owned();
    let body = response.bytes()?;

    Ok(HttpResponse {
        status_code,
        headers,
        body: body.to_vec(),
    })
}

/// Token state of the async client. Every region has its own slot and lock;
/// the write lock is held across the token round-trip so concurrent callers
/// in one region share one refresh, while other regions carry on.
pub struct TokenManager {
    http_client: reqwest::Client,
    settings: Arc<Settings>,
    clock: Arc<dyn Clock>,
    slots: [RwLock<Slot>; REGIONS],
}

impl TokenManager {
    pub(crate) fn new(
        http_client: reqwest::Client,
        settings: Arc<Settings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        TokenManager {
            http_client,
            settings,
            clock,
            slots: Default::default(),
        }
    }

    /// Return the cached token for `region`, fetching a new one when it is
    /// missing or about to expire.
    pub async fn ensure_valid_token(&self, region: Region) -> Result<Arc<Token>> {
        let slot = self.slot(region);

        // read lock: This will wait while a refresh of this region holds the write lock
        let cached = valid_token(&*slot.read().await, self.clock.now());
        if let Some(token) = cached {
            return Ok(token);
        }

        trace!("No valid token for '{}', acquiring the write lock", region);
        let mut slot = slot.write().await;

        // Another caller may have fetched one while we waited for the write lock
        if let Some(token) = valid_token(&slot, self.clock.now()) {
            return Ok(token);
        }

        debug!("Requesting a bearer token for '{}'", region);
        let token = Arc::new(self.fetch(region).await?);
        *slot = Some(Arc::clone(&token));
        Ok(token)
    }

    /// Replace `rejected` with a freshly fetched token, ignoring its expiry.
    pub async fn refresh(&self, region: Region, rejected: &Arc<Token>) -> Result<Arc<Token>> {
        let mut slot = self.slot(region).write().await;

        if let Some(token) = superseding_token(&slot, rejected, self.clock.now()) {
            trace!("Token for '{}' was already refreshed by another call", region);
            return Ok(token);
        }

        debug!("Refreshing bearer token for '{}'", region);
        let token = Arc::new(self.fetch(region).await?);
        *slot = Some(Arc::clone(&token));
        debug!("Refreshed bearer token for '{}'", region);
        Ok(token)
    }

    /// The cached token for `region`, whether or not it is still valid.
    pub async fn current(&self, region: Region) -> Option<Arc<Token>> {
        self.slot(region).read().await.clone()
    }

    fn slot(&self, region: Region) -> &RwLock<Slot> {
        &self.slots[region as usize]
    }

    async fn fetch(&self, region: Region) -> Result<Token> {
        let token_url = region.token_url(&self.settings.endpoints);
        let client = oauth_client(&self.settings, &token_url)?;
        let issued_at = self.clock.now();

        // Exchange the client_id and client_secret for a bearer token
        let response = credentials_request(&client, &self.settings.scopes)
            .request_async(|request| exchange(&self.http_client, request))
            .await
            .map_err(|err| fetch_failed(&token_url, err))?;

        trace!("Exchanged client credentials for a bearer token: {:?}", response);
        Token::from_response(&response, issued_at)
    }
}

/// Token state of the blocking client, same rules as [`TokenManager`].
pub struct BlockingTokenManager {
    http_client: reqwest::blocking::Client,
    settings: Arc<Settings>,
    clock: Arc<dyn Clock>,
    slots: [Mutex<Slot>; REGIONS],
}

impl BlockingTokenManager {
    pub(crate) fn new(
        http_client: reqwest::blocking::Client,
        settings: Arc<Settings>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        BlockingTokenManager {
            http_client,
            settings,
            clock,
            slots: Default::default(),
        }
    }

    pub fn ensure_valid_token(&self, region: Region) -> Result<Arc<Token>> {
        let mut slot = self.lock(region);
        if let Some(token) = valid_token(&slot, self.clock.now()) {
            return Ok(token);
        }

        debug!("Requesting a bearer token for '{}'", region);
        let token = Arc::new(self.fetch(region)?);
        *slot = Some(Arc::clone(&token));
        Ok(token)
    }

    pub fn refresh(&self, region: Region, rejected: &Arc<Token>) -> Result<Arc<Token>> {
        let mut slot = self.lock(region);
        if let Some(token) = superseding_token(&slot, rejected, self.clock.now()) {
            trace!("Token for '{}' was already refreshed by another call", region);
            return Ok(token);
        }

        debug!("Refreshing bearer token for '{}'", region);
        let token = Arc::new(self.fetch(region)?);
        *slot = Some(Arc::clone(&token));
        debug!("Refreshed bearer token for '{}'", region);
        Ok(token)
    }

    pub fn current(&self, region: Region) -> Option<Arc<Token>> {
        self.lock(region).clone()
    }

    // Slots only ever hold complete tokens, so a poisoned lock is still consistent
    fn lock(&self, region: Region) -> MutexGuard<'_, Slot> {
        self.slots[region as usize]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn fetch(&self, region: Region) -> Result<Token> {
        let token_url = region.token_url(&self.settings.endpoints);
        let client = oauth_client(&self.settings, &token_url)?;
        let issued_at = self.clock.now();

        let response = credentials_request(&client, &self.settings.scopes)
            .request(|request| exchange_blocking(&self.http_client, request))
            .map_err(|err| fetch_failed(&token_url, err))?;

        trace!("Exchanged client credentials for a bearer token: {:?}", response);
        Token::from_response(&response, issued_at)
    }
}
