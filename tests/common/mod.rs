#![allow(dead_code)]

use std::time::Duration;

use brightcove::{BaseUrls, Client, ClientBuilder, Credentials, RateLimit, RateLimits, RetryPolicy};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT: &str = "1234567";

/// Every API family routed to one mock server under its own prefix.
pub fn base_urls(server: &MockServer) -> BaseUrls {
    let uri = server.uri();
    BaseUrls {
        oauth: format!("{uri}/v4/access_token"),
        cms: format!("{uri}/cms/v1/accounts/"),
        analytics: format!("{uri}/analytics/v1"),
        syndication: format!("{uri}/social/v1/accounts/"),
        dynamic_ingest: format!("{uri}/ingest/v1/accounts/"),
        ingest_profiles: format!("{uri}/profiles/v1/"),
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
    }
}

pub async fn mount_oauth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v4/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "test-token",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .mount(server)
        .await;
}

pub fn builder(server: &MockServer) -> ClientBuilder {
    ClientBuilder::new()
        .credentials(Credentials::new("client-id", "client-secret", ACCOUNT))
        .base_urls(base_urls(server))
        .retry_policy(fast_retry())
        .rate_limits(RateLimits::uniform(RateLimit::per_second(50)))
}

/// A client against `server` with OAuth already mocked.
pub async fn client(server: &MockServer) -> Client {
    mount_oauth(server).await;
    builder(server).build().unwrap()
}

pub fn cms_path(rest: &str) -> String {
    format!("/cms/v1/accounts/{ACCOUNT}/{rest}")
}
