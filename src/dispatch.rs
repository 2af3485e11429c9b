//! Request execution: rate limiting, bearer auth, retries and response
//! decoding.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT, RETRY_AFTER};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenManager;
use crate::config::RetryPolicy;
use crate::errors::{BrightcoveError, ClientErrorKind, Result};
use crate::params::to_query_pairs;
use crate::rate_limit::RateLimiter;

/// One API call: verb, absolute URL, query pairs and optional JSON body.
#[derive(Debug, Clone)]
pub(crate) struct ApiRequest {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub(crate) fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub(crate) fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub(crate) fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub(crate) fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    pub(crate) fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Append the set fields of `query` as query parameters.
    pub(crate) fn query<Q: Serialize + ?Sized>(mut self, query: &Q) -> Result<Self> {
        self.query.extend(to_query_pairs(query)?);
        Ok(self)
    }

    pub(crate) fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| BrightcoveError::InvalidRequest(format!("unserializable body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// What a single attempt produced, before retry policy is applied.
enum Outcome {
    Success(String),
    Unauthorized(String),
    Retryable(BrightcoveError, Option<Duration>),
    Fatal(BrightcoveError),
}

/// Shared by every endpoint module of one API family.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl Dispatcher {
    pub(crate) fn new(
        http: reqwest::Client,
        tokens: Arc<TokenManager>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            http,
            tokens,
            limiter,
            retry,
        }
    }

    /// The connection pool, for calls that bypass the API (signed uploads).
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Execute `request` and decode the body as `T`.
    pub(crate) async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let text = self.execute(&request).await?;
        serde_json::from_str(&text).map_err(|e| BrightcoveError::Schema {
            endpoint: request.url.clone(),
            message: e.to_string(),
        })
    }

    /// Execute `request`, discarding any response body (e.g. `204 No Content`).
    pub(crate) async fn send_unit(&self, request: ApiRequest) -> Result<()> {
        self.execute(&request).await.map(drop)
    }

    /// Run the retry loop. Every attempt takes its own rate-limit permit,
    /// and the refresh retry after a 401 does not count against
    /// `max_attempts`.
    async fn execute(&self, request: &ApiRequest) -> Result<String> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0u32;
        let mut refreshed = false;

        loop {
            attempt += 1;
            let permit = self.limiter.acquire().await?;
            let token = self.tokens.token().await?;

            debug!(
                method = %request.method,
                url = %request.url,
                attempt,
                "sending request"
            );
            let outcome = self.attempt(request, &token).await;
            drop(permit);

            let (err, retry_after) = match outcome {
                Outcome::Success(body) => return Ok(body),
                Outcome::Fatal(err) => return Err(err),
                Outcome::Unauthorized(body) => {
                    if refreshed {
                        return Err(BrightcoveError::Auth {
                            message: format!(
                                "{} rejected a freshly issued token: {body}",
                                request.url
                            ),
                        });
                    }
                    debug!(url = %request.url, "401 received, refreshing token");
                    refreshed = true;
                    self.tokens.invalidate(&token).await;
                    attempt -= 1;
                    continue;
                }
                Outcome::Retryable(err, retry_after) => (err, retry_after),
            };

            if attempt >= max_attempts {
                warn!(url = %request.url, attempt, error = %err, "giving up after retries");
                return Err(err);
            }

            let delay = retry_after.unwrap_or_else(|| self.retry.backoff(attempt));
            warn!(
                url = %request.url,
                attempt,
                ?delay,
                error = %err,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, request: &ApiRequest, token: &str) -> Outcome {
        let mut builder = self
            .http
            .request(request.method.clone(), &request.url)
            .bearer_auth(token)
            .header(ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(source) => {
                return Outcome::Retryable(
                    BrightcoveError::Network {
                        endpoint: request.url.clone(),
                        source,
                    },
                    None,
                )
            }
        };

        let status = response.status();
        let retry_after = retry_after(response.headers());
        let body = match response.text().await {
            Ok(text) => text,
            Err(source) => {
                return Outcome::Retryable(
                    BrightcoveError::Network {
                        endpoint: request.url.clone(),
                        source,
                    },
                    None,
                )
            }
        };

        let code = status.as_u16();
        debug!(url = %request.url, status = code, "response received");

        if status.is_success() {
            return Outcome::Success(body);
        }
        if code == 401 {
            return Outcome::Unauthorized(body);
        }
        if status.is_server_error() {
            return Outcome::Retryable(
                BrightcoveError::Server {
                    status: code,
                    endpoint: request.url.clone(),
                    body,
                },
                retry_after,
            );
        }

        let err = BrightcoveError::Client {
            status: code,
            kind: ClientErrorKind::from_status(code),
            endpoint: request.url.clone(),
            body,
        };
        if code == 429 {
            Outcome::Retryable(err, retry_after)
        } else {
            Outcome::Fatal(err)
        }
    }
}

/// `Retry-After` as delta-seconds. HTTP-date values are ignored.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use std::time::Instant as StdInstant;

    use reqwest::header::HeaderValue;
    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{Credentials, RateLimit};

    #[derive(Debug, Deserialize)]
    struct Thing {
        id: String,
    }

    async fn mock_oauth(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/oauth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "tok-1",
                "token_type": "Bearer",
                "expires_in": 300
            })))
            .mount(server)
            .await;
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(50),
        }
    }

    fn dispatcher(server: &MockServer, limit: RateLimit) -> (Dispatcher, Arc<TokenManager>) {
        let http = reqwest::Client::new();
        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            format!("{}/oauth", server.uri()),
            &Credentials::new("id", "secret", "123"),
            Duration::from_secs(60),
        ));
        let limiter = Arc::new(RateLimiter::new(limit).unwrap());
        (
            Dispatcher::new(http, tokens.clone(), limiter, fast_retry()),
            tokens,
        )
    }

    #[test]
    fn parses_delta_seconds_retry_after() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("2"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));
        headers.insert(
            RETRY_AFTER,
            HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[tokio::test]
    async fn sends_bearer_query_and_body() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("POST"))
            .and(path("/things"))
            .and(header("authorization", "Bearer tok-1"))
            .and(query_param("limit", "5"))
            .and(body_json(json!({"name": "a"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "t1"})))
            .expect(1)
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let req = ApiRequest::post(format!("{}/things", server.uri()))
            .query(&json!({"limit": 5, "offset": null}))
            .unwrap()
            .json(&json!({"name": "a"}))
            .unwrap();
        let thing: Thing = d.send(req).await.unwrap();
        assert_eq!(thing.id, "t1");
    }

    #[tokio::test]
    async fn unauthorized_refreshes_once_and_retries() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let (d, tokens) = dispatcher(&server, RateLimit::per_second(10));
        let thing: Thing = d
            .send(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap();
        assert_eq!(thing.id, "1");
        assert_eq!(tokens.exchange_count(), 2);
    }

    #[tokio::test]
    async fn second_unauthorized_is_an_auth_error() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let (d, tokens) = dispatcher(&server, RateLimit::per_second(10));
        let err = d
            .send::<Thing>(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, BrightcoveError::Auth { .. }), "{err:?}");
        assert_eq!(tokens.exchange_count(), 2);
    }

    #[tokio::test]
    async fn each_retry_takes_its_own_permit() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        // One request per second, so the 10ms backoff is not what paces the retry.
        let (d, _) = dispatcher(&server, RateLimit::per_second(1));
        let started = StdInstant::now();
        let thing: Thing = d
            .send(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap();
        assert_eq!(thing.id, "1");
        assert!(
            started.elapsed() >= Duration::from_millis(900),
            "retried after {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn refresh_retry_takes_its_own_permit() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(401))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(1));
        let started = StdInstant::now();
        let _: Thing = d
            .send(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(900));
    }

    #[tokio::test]
    async fn too_many_requests_honours_retry_after() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "2"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let started = StdInstant::now();
        let thing: Thing = d
            .send(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap();
        assert_eq!(thing.id, "1");
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn server_errors_exhaust_attempts() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(503).set_body_string("down"))
            .expect(3)
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let err = d
            .send::<Thing>(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap_err();
        match err {
            BrightcoveError::Server { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "down");
            }
            other => panic!("expected Server, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn persistent_throttling_is_a_client_error() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let err = d
            .send::<Thing>(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BrightcoveError::Client {
                kind: ClientErrorKind::TooManyRequests,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/nope"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string(r#"[{"error_code":"RESOURCE_NOT_FOUND"}]"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let err = d
            .send::<Thing>(ApiRequest::get(format!("{}/things/nope", server.uri())))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn shape_mismatch_is_a_schema_error() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "no id"})))
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let err = d
            .send::<Thing>(ApiRequest::get(format!("{}/things/1", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, BrightcoveError::Schema { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn no_content_is_accepted_by_send_unit() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("DELETE"))
            .and(path("/things/1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        d.send_unit(ApiRequest::delete(format!("{}/things/1", server.uri())))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        let err = d
            .send::<Thing>(ApiRequest::get("http://127.0.0.1:1/things"))
            .await
            .unwrap_err();
        assert!(matches!(err, BrightcoveError::Network { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn cancelled_request_releases_its_permit() {
        let server = MockServer::start().await;
        mock_oauth(&server).await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": "slow"}))
                    .set_delay(Duration::from_secs(30)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/fast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "fast"})))
            .mount(&server)
            .await;

        let (d, _) = dispatcher(&server, RateLimit::per_second(10).with_max_in_flight(1));
        let slow = {
            let d = d.clone();
            let url = format!("{}/slow", server.uri());
            tokio::spawn(async move { d.send::<Thing>(ApiRequest::get(url)).await })
        };
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(d.limiter.available_slots(), 0);
        slow.abort();
        let _ = slow.await;

        let thing: Thing = tokio::time::timeout(
            Duration::from_secs(5),
            d.send(ApiRequest::get(format!("{}/fast", server.uri()))),
        )
        .await
        .expect("permit was not released")
        .unwrap();
        assert_eq!(thing.id, "fast");
    }

    #[tokio::test]
    async fn closed_limiter_fails_fast() {
        let server = MockServer::start().await;
        let (d, _) = dispatcher(&server, RateLimit::per_second(10));
        d.limiter.close();
        let err = d
            .send::<Thing>(ApiRequest::get(format!("{}/things", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, BrightcoveError::Closed));
    }
}
