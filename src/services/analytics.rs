use super::{check_id, Endpoint};
use crate::dispatch::ApiRequest;
use crate::errors::Result;
use crate::models::analytics::{
    AlltimeVideoViews, AnalyticsReport, DateRange, LivestreamAnalytics, Timeline, VideoEngagement,
};
use crate::models::Validate;
use crate::params::{AnalyticsReportQuery, LivestreamAnalyticsQuery};

/// Analytics API: engagement timelines, reports and live-stream series.
#[derive(Clone)]
pub struct Analytics {
    endpoint: Endpoint,
}

impl Analytics {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// A report query scoped to this client's account.
    pub fn report(&self, dimensions: impl Into<String>) -> AnalyticsReportQuery {
        AnalyticsReportQuery::new(self.endpoint.account_id(), dimensions)
    }

    pub async fn get_account_engagement(&self) -> Result<Timeline> {
        let url = self.endpoint.url(&format!(
            "/engagement/accounts/{}",
            self.endpoint.account_id()
        ));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn get_player_engagement(&self, player_id: &str) -> Result<Timeline> {
        check_id("player_id", player_id)?;
        let url = self.endpoint.url(&format!(
            "/engagement/accounts/{}/players/{player_id}",
            self.endpoint.account_id()
        ));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn get_video_engagement(&self, video_id: &str) -> Result<VideoEngagement> {
        check_id("video_id", video_id)?;
        let url = self.endpoint.url(&format!(
            "/engagement/accounts/{}/videos/{video_id}",
            self.endpoint.account_id()
        ));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn get_analytics_report(&self, query: &AnalyticsReportQuery) -> Result<AnalyticsReport> {
        query.validate()?;
        let request = ApiRequest::get(self.endpoint.url("/data")).query(query)?;
        self.endpoint.dispatch.send(request).await
    }

    /// Dates for which reconciled data is available for `query`.
    pub async fn get_available_date_range(&self, query: &AnalyticsReportQuery) -> Result<DateRange> {
        query.validate()?;
        let request = ApiRequest::get(self.endpoint.url("/data/status")).query(query)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn get_alltime_video_views(&self, video_id: &str) -> Result<AlltimeVideoViews> {
        check_id("video_id", video_id)?;
        let url = self.endpoint.url(&format!(
            "/alltime/accounts/{}/videos/{video_id}",
            self.endpoint.account_id()
        ));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn get_livestream_analytics(
        &self,
        query: &LivestreamAnalyticsQuery,
    ) -> Result<LivestreamAnalytics> {
        query.validate()?;
        let url = self.endpoint.url(&format!(
            "/timeseries/accounts/{}",
            self.endpoint.account_id()
        ));
        let request = ApiRequest::get(url).query(query)?;
        self.endpoint.dispatch.send(request).await
    }
}
