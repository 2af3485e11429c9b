//! OAuth2 client-credentials token cache.
//!
//! The cached token lives behind an async mutex that is held across the
//! credential exchange, so concurrent callers queue behind a single in-flight
//! refresh. A generation counter lets those waiters take the token the
//! refresh produced instead of starting another exchange.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Credentials;
use crate::errors::{BrightcoveError, Result};

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(300);
pub(crate) const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const EXCHANGE_ATTEMPTS: u32 = 3;
const EXCHANGE_BACKOFF: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct Token {
    bearer: String,
    expires_at: Instant,
}

impl Token {
    fn is_fresh(&self, now: Instant, margin: Duration) -> bool {
        now + margin < self.expires_at
    }

    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// `POST /v4/access_token` response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Default)]
struct TokenState {
    token: Option<Token>,
}

pub(crate) struct TokenManager {
    http: reqwest::Client,
    oauth_url: String,
    client_id: String,
    client_secret: String,
    refresh_margin: Duration,
    state: Mutex<TokenState>,
    generation: AtomicU64,
    exchanges: AtomicU64,
}

impl TokenManager {
    pub(crate) fn new(
        http: reqwest::Client,
        oauth_url: impl Into<String>,
        credentials: &Credentials,
        refresh_margin: Duration,
    ) -> Self {
        Self {
            http,
            oauth_url: oauth_url.into(),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            refresh_margin,
            state: Mutex::new(TokenState::default()),
            generation: AtomicU64::new(0),
            exchanges: AtomicU64::new(0),
        }
    }

    /// A bearer token that is valid now, refreshing it if needed.
    pub(crate) async fn token(&self) -> Result<String> {
        let observed = self.generation.load(Ordering::Acquire);
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if let Some(token) = &state.token {
            if token.is_fresh(now, self.refresh_margin) {
                return Ok(token.bearer.clone());
            }
            // Someone refreshed while we were queued on the lock.
            let refreshed_meanwhile = self.generation.load(Ordering::Acquire) != observed;
            if refreshed_meanwhile && !token.is_expired(now) {
                return Ok(token.bearer.clone());
            }
        }

        // A cancelled exchange drops the guard and leaves the old state intact.
        let token = self.exchange().await?;
        let bearer = token.bearer.clone();
        state.token = Some(token);
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(bearer)
    }

    /// Drop `rejected` from the cache if it is still the current token, so
    /// the next [`token`](Self::token) call performs one fresh exchange.
    pub(crate) async fn invalidate(&self, rejected: &str) {
        let mut state = self.state.lock().await;
        if state
            .token
            .as_ref()
            .is_some_and(|t| t.bearer == rejected)
        {
            debug!("invalidating rejected access token");
            state.token = None;
        }
    }

    /// Number of credential exchanges performed so far.
    #[cfg(test)]
    pub(crate) fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    async fn exchange(&self) -> Result<Token> {
        let mut last_err: Option<BrightcoveError> = None;

        for attempt in 1..=EXCHANGE_ATTEMPTS {
            if attempt > 1 {
                tokio::time::sleep(EXCHANGE_BACKOFF * (1 << (attempt - 2))).await;
            }
            self.exchanges.fetch_add(1, Ordering::Relaxed);
            debug!(attempt, url = %self.oauth_url, "requesting access token");

            let response = match self
                .http
                .post(&self.oauth_url)
                .basic_auth(&self.client_id, Some(&self.client_secret))
                .header(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                )
                .form(&[("grant_type", "client_credentials")])
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    warn!(attempt, error = %e, "token endpoint unreachable");
                    last_err = Some(BrightcoveError::Auth {
                        message: format!("token endpoint unreachable: {e}"),
                    });
                    continue;
                }
            };

            let status = response.status();
            if status.is_server_error() {
                warn!(attempt, %status, "token endpoint returned a server error");
                last_err = Some(BrightcoveError::Auth {
                    message: format!("token endpoint returned {status}"),
                });
                continue;
            }

            let text = match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!(%status, error = %e, "could not read token endpoint response");
                    format!("<unreadable body: {e}>")
                }
            };
            if !status.is_success() {
                return Err(BrightcoveError::Auth {
                    message: format!("credential exchange rejected with {status}: {text}"),
                });
            }

            let parsed: TokenResponse =
                serde_json::from_str(&text).map_err(|e| BrightcoveError::Auth {
                    message: format!("malformed token response: {e}"),
                })?;
            let bearer = parsed
                .access_token
                .filter(|t| !t.is_empty())
                .ok_or_else(|| BrightcoveError::Auth {
                    message: "Failed to fetch access token: response had no access_token"
                        .into(),
                })?;
            let lifetime = parsed
                .expires_in
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TOKEN_LIFETIME);

            info!(expires_in = ?lifetime, "obtained new access token");
            return Ok(Token {
                bearer,
                expires_at: Instant::now() + lifetime,
            });
        }

        Err(last_err.unwrap_or_else(|| BrightcoveError::Auth {
            message: "credential exchange failed after all retries".into(),
        }))
    }
}
