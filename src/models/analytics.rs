//! Analytics API schemas.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// A series of per-bucket values, e.g. percent of viewers at each 1/100th
/// of a video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimeSeries {
    #[serde(rename = "type")]
    pub kind: String,
    pub values: Vec<f64>,
}

/// Account or player engagement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    pub timeline: TimeSeries,
}

/// Engagement for a single video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoEngagement {
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    /// Seconds.
    #[serde(default)]
    pub video_duration: Option<f64>,
    pub timeline: TimeSeries,
}

/// `GET /data`. Item shape depends on the requested dimensions and fields.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyticsReport {
    pub item_count: u64,
    pub items: Vec<BTreeMap<String, Value>>,
    #[serde(default)]
    pub summary: BTreeMap<String, Value>,
}

impl AnalyticsReport {
    /// Numeric value of `field` in the summary row.
    pub fn summary_metric(&self, field: &str) -> Option<f64> {
        self.summary.get(field).and_then(Value::as_f64)
    }
}

/// `GET /data/status`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    pub reconciled_from: String,
    pub reconciled_to: String,
}

/// `GET /alltime/accounts/{account}/videos/{video}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct AlltimeVideoViews {
    pub alltime_video_views: u64,
}

/// One bucket of a live-stream time series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LivestreamBucket {
    /// Epoch milliseconds at the start of the bucket.
    pub timestamp: i64,
    #[serde(default)]
    pub value: Option<f64>,
}

/// `GET /timeseries/accounts/{account}`: buckets keyed by metric.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LivestreamAnalytics {
    #[serde(default)]
    pub dimensions: Option<String>,
    #[serde(rename = "where", default)]
    pub where_: Option<String>,
    pub metrics: BTreeMap<String, Vec<LivestreamBucket>>,
}
