use super::{check_id, Endpoint};
use crate::dispatch::ApiRequest;
use crate::errors::Result;
use crate::models::ingest::{AccountProfileConfig, IngestProfile};

/// Ingest Profiles API: the transcoding profiles available to the account.
#[derive(Clone)]
pub struct IngestProfiles {
    endpoint: Endpoint,
}

impl IngestProfiles {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    fn account_path(&self, path: &str) -> String {
        self.endpoint
            .url(&format!("accounts/{}/{path}", self.endpoint.account_id()))
    }

    pub async fn get_ingest_profiles(&self) -> Result<Vec<IngestProfile>> {
        let url = self.account_path("profiles");
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn get_ingest_profile(&self, profile_id: &str) -> Result<IngestProfile> {
        check_id("profile_id", profile_id)?;
        let url = self.account_path(&format!("profiles/{profile_id}"));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    /// The account's default profile selection.
    pub async fn get_default_profile(&self) -> Result<AccountProfileConfig> {
        let url = self.account_path("configuration");
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }
}
