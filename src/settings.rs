use serde::Deserialize;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://{region}.api.blizzard.com";
pub const DEFAULT_API_URL_CN: &str = "https://gateway.battlenet.com.cn";
pub const DEFAULT_TOKEN_URL: &str = "https://{region}.battle.net/oauth/token";
pub const DEFAULT_TOKEN_URL_CN: &str = "https://www.battlenet.com.cn/oauth/token";

/// Everything a client needs to authenticate and reach the API.
#[derive(Clone, Deserialize)]
pub struct Settings {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub cache: CacheSettings,
    /// Transport timeout per request, the reqwest default applies when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Settings {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: Vec::new(),
            endpoints: Endpoints::default(),
            cache: CacheSettings::default(),
            timeout_secs: None,
        }
    }

    pub(crate) fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("scopes", &self.scopes)
            .field("endpoints", &self.endpoints)
            .field("cache", &self.cache)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Host templates. `{region}` is replaced by the lowercase region code; the
/// `_cn` variants are used verbatim for the China region.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Endpoints {
    pub api_url: String,
    pub api_url_cn: String,
    pub token_url: String,
    pub token_url_cn: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            api_url: DEFAULT_API_URL.to_string(),
            api_url_cn: DEFAULT_API_URL_CN.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            token_url_cn: DEFAULT_TOKEN_URL_CN.to_string(),
        }
    }
}

/// Bounds of the per-client memoization table.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    /// `None` leaves the table unbounded
    pub max_entries: Option<u64>,
    pub time_to_live_secs: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings {
            max_entries: Some(10_000),
            time_to_live_secs: None,
        }
    }
}

impl CacheSettings {
    pub(crate) fn time_to_live(&self) -> Option<Duration> {
        self.time_to_live_secs.map(Duration::from_secs)
    }
}
