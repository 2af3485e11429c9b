use std::fmt;
use std::time::Duration;

use crate::errors::{BrightcoveError, Result};

pub(crate) const DEFAULT_OAUTH_URL: &str = "https://oauth.brightcove.com/v4/access_token";
pub(crate) const DEFAULT_CMS_BASE_URL: &str = "https://cms.api.brightcove.com/v1/accounts/";
pub(crate) const DEFAULT_ANALYTICS_BASE_URL: &str = "https://analytics.api.brightcove.com/v1";
pub(crate) const DEFAULT_SYNDICATION_BASE_URL: &str =
    "https://edge.social.api.brightcove.com/v1/accounts/";
pub(crate) const DEFAULT_DYNAMIC_INGEST_BASE_URL: &str =
    "https://ingest.api.brightcove.com/v1/accounts/";
pub(crate) const DEFAULT_INGEST_PROFILES_BASE_URL: &str =
    "https://ingestion.api.brightcove.com/v1/";

/// OAuth client credentials plus the account every call is scoped to.
#[derive(Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub account_id: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            account_id: account_id.into(),
        }
    }

    /// Read `BRIGHTCOVE_CLIENT_ID`, `BRIGHTCOVE_CLIENT_SECRET` and
    /// `BRIGHTCOVE_ACCOUNT_ID`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client_id: required_env("BRIGHTCOVE_CLIENT_ID")?,
            client_secret: required_env("BRIGHTCOVE_CLIENT_SECRET")?,
            account_id: required_env("BRIGHTCOVE_ACCOUNT_ID")?,
        })
    }

    pub(crate) fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("account_id", &self.account_id),
        ] {
            if value.trim().is_empty() {
                return Err(BrightcoveError::Config(format!("{name} must not be empty")));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("account_id", &self.account_id)
            .finish()
    }
}

fn required_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| {
        BrightcoveError::Config(format!(
            "{name} is not set. Pass credentials to ClientBuilder::credentials() \
             or set the BRIGHTCOVE_* environment variables."
        ))
    })
}

/// Base URLs of each API family. Paths are appended verbatim, so keep the
/// trailing slash where the defaults have one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrls {
    pub oauth: String,
    pub cms: String,
    pub analytics: String,
    pub syndication: String,
    pub dynamic_ingest: String,
    pub ingest_profiles: String,
}

impl Default for BaseUrls {
    fn default() -> Self {
        Self {
            oauth: DEFAULT_OAUTH_URL.to_string(),
            cms: DEFAULT_CMS_BASE_URL.to_string(),
            analytics: DEFAULT_ANALYTICS_BASE_URL.to_string(),
            syndication: DEFAULT_SYNDICATION_BASE_URL.to_string(),
            dynamic_ingest: DEFAULT_DYNAMIC_INGEST_BASE_URL.to_string(),
            ingest_profiles: DEFAULT_INGEST_PROFILES_BASE_URL.to_string(),
        }
    }
}

impl BaseUrls {
    /// Defaults, overridden by any `BRIGHTCOVE_*_BASE_URL` /
    /// `BRIGHTCOVE_OAUTH_URL` variables that are set.
    pub fn from_env() -> Self {
        let mut urls = Self::default();
        for (var, slot) in [
            ("BRIGHTCOVE_OAUTH_URL", &mut urls.oauth),
            ("BRIGHTCOVE_CMS_BASE_URL", &mut urls.cms),
            ("BRIGHTCOVE_ANALYTICS_BASE_URL", &mut urls.analytics),
            ("BRIGHTCOVE_SYNDICATION_BASE_URL", &mut urls.syndication),
            ("BRIGHTCOVE_DYNAMIC_INGEST_BASE_URL", &mut urls.dynamic_ingest),
            ("BRIGHTCOVE_INGEST_PROFILES_BASE_URL", &mut urls.ingest_profiles),
        ] {
            if let Ok(value) = std::env::var(var) {
                *slot = value;
            }
        }
        urls
    }
}

/// How the dispatcher retries transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub initial_backoff: Duration,
    /// Upper bound for the computed backoff. `Retry-After` is not capped.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// A requests-per-interval budget with a cap on concurrent requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests: u32,
    pub per: Duration,
    pub max_in_flight: usize,
}

impl RateLimit {
    /// `n` requests per second, with at most `n` in flight.
    pub fn per_second(n: u32) -> Self {
        Self {
            requests: n,
            per: Duration::from_secs(1),
            max_in_flight: n as usize,
        }
    }

    pub fn with_max_in_flight(mut self, n: usize) -> Self {
        self.max_in_flight = n;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.requests == 0 || self.max_in_flight == 0 || self.per.is_zero() {
            return Err(BrightcoveError::Config(format!(
                "rate limit must admit at least one request: {self:?}"
            )));
        }
        Ok(())
    }
}

/// Per-service rate-limit budgets. CMS and playlists share one budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimits {
    pub cms: RateLimit,
    pub analytics: RateLimit,
    pub syndication: RateLimit,
    pub dynamic_ingest: RateLimit,
    pub ingest_profiles: RateLimit,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            cms: RateLimit::per_second(4),
            analytics: RateLimit::per_second(10),
            syndication: RateLimit::per_second(10),
            dynamic_ingest: RateLimit::per_second(10),
            ingest_profiles: RateLimit::per_second(4),
        }
    }
}

impl RateLimits {
    /// The same budget for every service.
    pub fn uniform(limit: RateLimit) -> Self {
        Self {
            cms: limit,
            analytics: limit,
            syndication: limit,
            dynamic_ingest: limit,
            ingest_profiles: limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_urls_match_platform() {
        let urls = BaseUrls::default();
        assert_eq!(urls.cms, "https://cms.api.brightcove.com/v1/accounts/");
        assert_eq!(urls.analytics, "https://analytics.api.brightcove.com/v1");
        assert_eq!(
            urls.syndication,
            "https://edge.social.api.brightcove.com/v1/accounts/"
        );
        assert_eq!(
            urls.dynamic_ingest,
            "https://ingest.api.brightcove.com/v1/accounts/"
        );
        assert_eq!(urls.ingest_profiles, "https://ingestion.api.brightcove.com/v1/");
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(5),
        };
        assert_eq!(policy.backoff(1), Duration::from_secs(1));
        assert_eq!(policy.backoff(2), Duration::from_secs(2));
        assert_eq!(policy.backoff(3), Duration::from_secs(4));
        assert_eq!(policy.backoff(4), Duration::from_secs(5));
        assert_eq!(policy.backoff(40), Duration::from_secs(5));
    }

    #[test]
    fn secret_is_masked_in_debug() {
        let creds = Credentials::new("id", "super-secret", "123");
        let printed = format!("{creds:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("123"));
    }

    #[test]
    fn blank_credentials_are_rejected() {
        let creds = Credentials::new("id", " ", "123");
        assert!(matches!(
            creds.validate(),
            Err(BrightcoveError::Config(msg)) if msg.contains("client_secret")
        ));
    }

    #[test]
    fn zero_budget_is_rejected() {
        assert!(RateLimit::per_second(0).validate().is_err());
        assert!(RateLimit::per_second(3)
            .with_max_in_flight(0)
            .validate()
            .is_err());
        assert!(RateLimit::per_second(3).validate().is_ok());
    }

    #[test]
    fn cms_budget_is_stricter_by_default() {
        let limits = RateLimits::default();
        assert_eq!(limits.cms.requests, 4);
        assert_eq!(limits.analytics.requests, 10);
    }
}
