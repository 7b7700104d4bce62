use crate::error::{Error, Result};
use crate::settings::Endpoints;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const REGION_PLACEHOLDER: &str = "{region}";

/// A partition of the service. `Cn` runs behind its own gateway and OAuth
/// host instead of the templated ones shared by the other regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Eu,
    Kr,
    Tw,
    Cn,
}

/// The rendered hosts for one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hosts {
    pub api_base: String,
    pub token_url: String,
}

impl Region {
    pub const ALL: [Region; 5] = [Region::Us, Region::Eu, Region::Kr, Region::Tw, Region::Cn];

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Eu => "eu",
            Region::Kr => "kr",
            Region::Tw => "tw",
            Region::Cn => "cn",
        }
    }

    /// Validates a region code. Codes are matched exactly, `"EU"` is rejected.
    pub fn resolve(code: &str) -> Result<Self> {
        Region::ALL
            .iter()
            .copied()
            .find(|region| region.as_str() == code)
            .ok_or_else(|| Error::InvalidRegion(code.to_string()))
    }

    pub fn api_base(self, endpoints: &Endpoints) -> String {
        match self {
            Region::Cn => endpoints.api_url_cn.clone(),
            _ => endpoints.api_url.replace(REGION_PLACEHOLDER, self.as_str()),
        }
    }

    pub fn token_url(self, endpoints: &Endpoints) -> String {
        match self {
            Region::Cn => endpoints.token_url_cn.clone(),
            _ => endpoints.token_url.replace(REGION_PLACEHOLDER, self.as_str()),
        }
    }

    pub fn hosts(self, endpoints: &Endpoints) -> Hosts {
        Hosts {
            api_base: self.api_base(endpoints),
            token_url: self.token_url(endpoints),
        }
    }
}

/// Validate `code` and render both hosts for it.
pub fn resolve_hosts(code: &str, endpoints: &Endpoints) -> Result<Hosts> {
    Ok(Region::resolve(code)?.hosts(endpoints))
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(code: &str) -> Result<Self> {
        Region::resolve(code)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
