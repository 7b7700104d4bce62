#![allow(dead_code)]

use battlenet_client::{Endpoints, Settings};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

/// Settings whose endpoints all point at `server`:
/// - standard API under `/{region}`, token endpoint `/{region}/oauth/token`
/// - China API under `/gateway-cn`, token endpoint `/oauth-cn/token`
pub fn settings_for(server: &MockServer) -> Settings {
    let mut settings = Settings::new(CLIENT_ID, CLIENT_SECRET);
    settings.endpoints = Endpoints {
        api_url: format!("{}/{{region}}", server.uri()),
        api_url_cn: format!("{}/gateway-cn", server.uri()),
        token_url: format!("{}/{{region}}/oauth/token", server.uri()),
        token_url_cn: format!("{}/oauth-cn/token", server.uri()),
    };
    settings
}

pub fn token_path(region: &str) -> String {
    if region == "cn" {
        "/oauth-cn/token".to_string()
    } else {
        format!("/{}/oauth/token", region)
    }
}

pub fn token_body(access_token: &str, expires_in: u64) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": expires_in,
        "sub": CLIENT_ID
    })
}

pub async fn mount_token(server: &MockServer, region: &str, access_token: &str, expires_in: u64) {
    Mock::given(method("POST"))
        .and(path(token_path(region)))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(access_token, expires_in)))
        .mount(server)
        .await;
}

/// A token endpoint that answers only after `delay`.
pub async fn mount_slow_token(server: &MockServer, region: &str, access_token: &str, delay: Duration) {
    Mock::given(method("POST"))
        .and(path(token_path(region)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body(access_token, 3600))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// The token endpoint hands out `first` once and `second` afterwards.
pub async fn mount_token_sequence(server: &MockServer, region: &str, first: &str, second: &str) {
    Mock::given(method("POST"))
        .and(path(token_path(region)))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body(first, 3600)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(server)
        .await;
    mount_token(server, region, second, 3600).await;
}

pub async fn mount_invalid_credentials(server: &MockServer, region: &str) {
    Mock::given(method("POST"))
        .and(path(token_path(region)))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "Invalid client credentials"
        })))
        .mount(server)
        .await;
}

pub async fn mount_resource(server: &MockServer, resource_path: &str, access_token: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(resource_path))
        .and(header("authorization", format!("Bearer {}", access_token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn mount_status(server: &MockServer, resource_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(resource_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Number of requests `server` received for `request_path`.
pub async fn requests_to(server: &MockServer, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == request_path)
        .count()
}

pub async fn total_requests(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

/// A local address nothing is listening on.
pub fn dead_endpoint() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", address)
}
