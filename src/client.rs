use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::auth::{TokenManager, DEFAULT_REFRESH_MARGIN};
use crate::config::{BaseUrls, Credentials, RateLimit, RateLimits, RetryPolicy};
use crate::dispatch::Dispatcher;
use crate::errors::{BrightcoveError, Result};
use crate::rate_limit::RateLimiter;
use crate::services::{
    Analytics, Cms, DynamicIngest, Endpoint, IngestProfiles, Playlists, Syndication,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Builder for constructing a [`Client`] with custom configuration.
///
/// # Example
///
/// ```no_run
/// use brightcove::{ClientBuilder, Credentials, RetryPolicy};
/// use std::time::Duration;
///
/// # fn example() -> brightcove::Result<()> {
/// let client = ClientBuilder::new()
///     .credentials(Credentials::new("client-id", "client-secret", "1234567"))
///     .retry_policy(RetryPolicy {
///         max_attempts: 3,
///         ..RetryPolicy::default()
///     })
///     .timeout(Duration::from_secs(120))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    credentials: Option<Credentials>,
    base_urls: Option<BaseUrls>,
    retry: RetryPolicy,
    rate_limits: RateLimits,
    timeout: Duration,
    refresh_margin: Duration,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            credentials: None,
            base_urls: None,
            retry: RetryPolicy::default(),
            rate_limits: RateLimits::default(),
            timeout: DEFAULT_TIMEOUT,
            refresh_margin: DEFAULT_REFRESH_MARGIN,
            http: None,
        }
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Override every base URL. Without this, [`BaseUrls::from_env`] applies.
    pub fn base_urls(mut self, urls: BaseUrls) -> Self {
        self.base_urls = Some(urls);
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn rate_limits(mut self, limits: RateLimits) -> Self {
        self.rate_limits = limits;
        self
    }

    /// Per-request HTTP timeout (defaults to 60 seconds). Ignored when an
    /// HTTP client is supplied with [`http_client`](Self::http_client).
    pub fn timeout(mut self, d: Duration) -> Self {
        self.timeout = d;
        self
    }

    /// Refresh the access token this long before it expires (defaults to
    /// 60 seconds).
    pub fn token_refresh_margin(mut self, margin: Duration) -> Self {
        self.refresh_margin = margin;
        self
    }

    /// Use an existing connection pool instead of building one.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Build the [`Client`].
    ///
    /// If no credentials were set via [`credentials`](Self::credentials), the
    /// builder reads `BRIGHTCOVE_CLIENT_ID`, `BRIGHTCOVE_CLIENT_SECRET` and
    /// `BRIGHTCOVE_ACCOUNT_ID`.
    ///
    /// Returns [`BrightcoveError::Config`] if credentials are missing or any
    /// budget is unusable.
    pub fn build(self) -> Result<Client> {
        let credentials = match self.credentials {
            Some(c) => c,
            None => Credentials::from_env()?,
        };
        credentials.validate()?;
        if self.retry.max_attempts == 0 {
            return Err(BrightcoveError::Config(
                "retry policy must allow at least one attempt".into(),
            ));
        }
        let limits = self.rate_limits;
        for limit in [
            limits.cms,
            limits.analytics,
            limits.syndication,
            limits.dynamic_ingest,
            limits.ingest_profiles,
        ] {
            limit.validate()?;
        }

        let urls = self.base_urls.unwrap_or_else(BaseUrls::from_env);
        let http = match self.http {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(BrightcoveError::Http)?,
        };

        let tokens = Arc::new(TokenManager::new(
            http.clone(),
            urls.oauth.clone(),
            &credentials,
            self.refresh_margin,
        ));

        let mut limiters = Vec::with_capacity(5);
        let mut endpoint = |limit: RateLimit, base_url: &str| -> Result<Endpoint> {
            let limiter = Arc::new(RateLimiter::new(limit)?);
            limiters.push(limiter.clone());
            let dispatch = Dispatcher::new(http.clone(), tokens.clone(), limiter, self.retry);
            Ok(Endpoint::new(dispatch, base_url, credentials.account_id.clone()))
        };

        // Playlists live on the CMS API and share its quota.
        let cms_endpoint = endpoint(limits.cms, &urls.cms)?;
        let analytics = Analytics::new(endpoint(limits.analytics, &urls.analytics)?);
        let syndication = Syndication::new(endpoint(limits.syndication, &urls.syndication)?);
        let dynamic_ingest =
            DynamicIngest::new(endpoint(limits.dynamic_ingest, &urls.dynamic_ingest)?);
        let ingest_profiles =
            IngestProfiles::new(endpoint(limits.ingest_profiles, &urls.ingest_profiles)?);

        debug!(account_id = %credentials.account_id, "brightcove client built");

        Ok(Client {
            inner: Arc::new(Inner {
                account_id: credentials.account_id.clone(),
                cms: Cms::new(cms_endpoint.clone()),
                playlists: Playlists::new(cms_endpoint),
                analytics,
                syndication,
                dynamic_ingest,
                ingest_profiles,
                limiters,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Inner {
    account_id: String,
    cms: Cms,
    playlists: Playlists,
    analytics: Analytics,
    syndication: Syndication,
    dynamic_ingest: DynamicIngest,
    ingest_profiles: IngestProfiles,
    limiters: Vec<Arc<RateLimiter>>,
}

/// The Brightcove API client.
///
/// Cheap to clone: clones share one connection pool, one token cache and
/// the per-service rate limiters. Use [`Client::new`] for quick
/// construction or [`ClientBuilder`] for full control.
///
/// # Example
///
/// ```no_run
/// use brightcove::{Client, Credentials, VideoQuery};
///
/// # async fn example() -> brightcove::Result<()> {
/// let client = Client::new(Credentials::new("client-id", "client-secret", "1234567"))?;
///
/// let videos = client.cms().get_videos(&VideoQuery::search("tags:nature")).await?;
/// println!("{} videos", videos.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Create a client with default settings.
    ///
    /// For customization, use [`ClientBuilder`] instead.
    pub fn new(credentials: Credentials) -> Result<Self> {
        ClientBuilder::new().credentials(credentials).build()
    }

    /// Build a client entirely from `BRIGHTCOVE_*` environment variables.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The account every call is scoped to.
    pub fn account_id(&self) -> &str {
        &self.inner.account_id
    }

    pub fn cms(&self) -> &Cms {
        &self.inner.cms
    }

    pub fn playlists(&self) -> &Playlists {
        &self.inner.playlists
    }

    pub fn analytics(&self) -> &Analytics {
        &self.inner.analytics
    }

    pub fn syndication(&self) -> &Syndication {
        &self.inner.syndication
    }

    pub fn dynamic_ingest(&self) -> &DynamicIngest {
        &self.inner.dynamic_ingest
    }

    pub fn ingest_profiles(&self) -> &IngestProfiles {
        &self.inner.ingest_profiles
    }

    /// Stop admitting requests on every clone of this client. Requests
    /// waiting for a rate-limit slot, and any issued later, fail with
    /// [`BrightcoveError::Closed`]; requests already on the wire complete.
    pub fn close(&self) {
        for limiter in &self.inner.limiters {
            limiter.close();
        }
        debug!(account_id = %self.inner.account_id, "brightcove client closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.limiters.iter().all(|l| l.is_closed())
    }
}
