use super::{check_id, Endpoint};
use crate::dispatch::ApiRequest;
use crate::errors::Result;
use crate::models::syndication::SyndicationFeed;
use crate::models::Validate;

/// Social syndication: MRSS feeds of account content.
#[derive(Clone)]
pub struct Syndication {
    endpoint: Endpoint,
}

impl Syndication {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    fn feeds_url(&self) -> String {
        self.endpoint.account_url("mrss/syndications")
    }

    fn feed_url(&self, syndication_id: &str) -> Result<String> {
        check_id("syndication_id", syndication_id)?;
        Ok(format!("{}/{syndication_id}", self.feeds_url()))
    }

    pub async fn get_all_syndications(&self) -> Result<Vec<SyndicationFeed>> {
        self.endpoint
            .dispatch
            .send(ApiRequest::get(self.feeds_url()))
            .await
    }

    pub async fn get_syndication(&self, syndication_id: &str) -> Result<SyndicationFeed> {
        let url = self.feed_url(syndication_id)?;
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn create_syndication(&self, feed: &SyndicationFeed) -> Result<SyndicationFeed> {
        feed.validate()?;
        let request = ApiRequest::post(self.feeds_url()).json(feed)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn update_syndication(
        &self,
        syndication_id: &str,
        feed: &SyndicationFeed,
    ) -> Result<SyndicationFeed> {
        feed.validate()?;
        let request = ApiRequest::patch(self.feed_url(syndication_id)?).json(feed)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn delete_syndication(&self, syndication_id: &str) -> Result<()> {
        let url = self.feed_url(syndication_id)?;
        self.endpoint.dispatch.send_unit(ApiRequest::delete(url)).await
    }
}
