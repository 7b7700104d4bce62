//! # Battle.net Client
//! Read access to the region-partitioned Battle.net REST APIs, which are protected by oauth 2.0 client credentials authorization.
//! The client is based on the `Reqwest` and `Oauth2` library and comes in an async ([`Client`]) and a blocking ([`blocking::Client`]) flavour.
//!
//! Both flavours:
//! - fetch a bearer token per region on first use and reuse it until 60 seconds before it expires
//! - refresh the token and retry exactly once when the API answers `401 Unauthorized`
//! - report failures as one of the [`ErrorKind`]s
//! - memoize successful reads for the lifetime of the client
//!
//! For now this library only supports `GET` endpoints which return `json` bodies.
//!
//! ## Example code
//! ```no_run
//!# async fn doc_test() -> anyhow::Result<()> {
//!# use serde::Deserialize;
//!# #[derive(Deserialize)]
//!# struct TokenIndex { price: u64 }
//! use battlenet_client::{Client, Namespace, Region, RequestDescriptor, Settings};
//!
//! // Set up the client, no request is sent yet
//! let client = Client::open(Settings::new("xxxxxxxxxx", "xxxxxxxxxx"))?;
//!
//! // Untyped region codes are validated before anything goes over the wire
//! let index: TokenIndex = client
//!     .get("/data/wow/token/index", "eu", &[("namespace", "dynamic-eu"), ("locale", "en_GB")])
//!     .await?;
//!
//! // Or describe the request up front
//! let request = RequestDescriptor::new("/data/wow/token/index", Region::Us)
//!     .namespace(Namespace::Dynamic)
//!     .locale("en_US");
//! let index: TokenIndex = client.get_json(&request).await?;
//!
//! client.close();
//!# Ok(())
//!# }
//! ```
pub mod blocking;
mod classify;
mod client;
pub mod clock;
mod dispatch;
mod error;
pub mod memo;
mod region;
mod request;
mod search;
mod settings;
pub mod token;

pub use crate::client::Client;
pub use crate::error::{BoxError, Error, ErrorKind, Result, SharedError};
pub use crate::region::{resolve_hosts, Hosts, Region};
pub use crate::request::{Namespace, RequestDescriptor};
pub use crate::search::SearchQuery;
pub use crate::settings::{CacheSettings, Endpoints, Settings};
pub use crate::token::{Token, TOKEN_EXPIRY_SKEW};
