//! # Brightcove API client for Rust
//!
//! Async client for the [Brightcove](https://www.brightcove.com) video
//! platform: CMS videos and playlists, analytics, social syndication,
//! dynamic ingest and ingest profiles.
//!
//! Every request goes through the same pipeline. An OAuth2 client-credentials
//! token is fetched once and shared until it nears expiry, a per-API rate
//! limiter keeps the client within the platform's quotas, and transient
//! failures (connection errors, 5xx, 429) are retried with exponential
//! backoff. Responses are decoded into typed models; anything that does not
//! fit is reported as [`BrightcoveError::Schema`] rather than silently
//! dropped.
//!
//! ## Quick start
//!
//! ```no_run
//! use brightcove::models::cms::{CreateVideoRequest, VideoState};
//! use brightcove::{Client, Credentials};
//!
//! #[tokio::main]
//! async fn main() -> brightcove::Result<()> {
//!     let client = Client::new(Credentials::new("client-id", "client-secret", "1234567"))?;
//!
//!     let video = client
//!         .cms()
//!         .create_video(&CreateVideoRequest::new("My video").state(VideoState::Active))
//!         .await?;
//!     println!("created {:?}", video.id);
//!
//!     let views = client
//!         .analytics()
//!         .get_alltime_video_views(video.id.as_deref().unwrap_or_default())
//!         .await?;
//!     println!("{} views", views.alltime_video_views);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration from the environment
//!
//! [`Client::from_env`] reads `BRIGHTCOVE_CLIENT_ID`,
//! `BRIGHTCOVE_CLIENT_SECRET` and `BRIGHTCOVE_ACCOUNT_ID`. Base URLs can be
//! redirected (for example at a mock server) with `BRIGHTCOVE_OAUTH_URL` and
//! `BRIGHTCOVE_{CMS,ANALYTICS,SYNDICATION,DYNAMIC_INGEST,INGEST_PROFILES}_BASE_URL`.
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events for attempts, retries and token
//! refreshes. It never installs a subscriber.

mod auth;
mod client;
mod config;
mod dispatch;
mod errors;
pub mod models;
pub mod params;
mod rate_limit;
pub mod services;

pub use client::{Client, ClientBuilder};
pub use config::{BaseUrls, Credentials, RateLimit, RateLimits, RetryPolicy};
pub use errors::{BrightcoveError, ClientErrorKind, Result};
pub use models::Validate;
pub use params::{
    AnalyticsReportQuery, DateBound, LivestreamAnalyticsQuery, PlaylistQuery, ReportFormat,
    VideoCountQuery, VideoQuery,
};
