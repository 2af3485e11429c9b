//! Endpoint modules. Each one validates its input, fills in a fixed path
//! template and hands the call to the shared [`Dispatcher`]; retries, auth
//! and rate limiting all live below this layer.

mod analytics;
mod cms;
mod dynamic_ingest;
mod ingest_profiles;
mod playlists;
mod syndication;

pub use analytics::Analytics;
pub use cms::{Cms, MAX_VIDEO_IDS};
pub use dynamic_ingest::DynamicIngest;
pub use ingest_profiles::IngestProfiles;
pub use playlists::Playlists;
pub use syndication::Syndication;

use crate::dispatch::Dispatcher;
use crate::errors::{BrightcoveError, Result};

/// What every endpoint module carries: the dispatcher for its API family,
/// that family's base URL and the account from the credentials.
#[derive(Clone)]
pub(crate) struct Endpoint {
    pub(crate) dispatch: Dispatcher,
    base_url: String,
    account_id: String,
}

impl Endpoint {
    pub(crate) fn new(
        dispatch: Dispatcher,
        base_url: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            dispatch,
            base_url: base_url.into(),
            account_id: account_id.into(),
        }
    }

    pub(crate) fn account_id(&self) -> &str {
        &self.account_id
    }

    /// `{base}{path}`, with `path` appended verbatim.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `{base}{account}/{path}`, or `{base}{account}` when `path` is empty.
    pub(crate) fn account_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}{}", self.base_url, self.account_id)
        } else {
            format!("{}{}/{}", self.base_url, self.account_id, path)
        }
    }
}

/// Reject ids that are blank or would break out of their path segment.
pub(crate) fn check_id(field: &str, id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(BrightcoveError::InvalidRequest(format!(
            "{field} must not be empty"
        )));
    }
    // URL parsers collapse dot segments, including their percent-encoded form.
    let dots = id.to_ascii_lowercase().replace("%2e", ".");
    if id.contains(['/', '?', '#']) || dots == "." || dots == ".." {
        return Err(BrightcoveError::InvalidRequest(format!(
            "{field} contains a reserved character: {id:?}"
        )));
    }
    Ok(())
}
