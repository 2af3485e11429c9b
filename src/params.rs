//! Query-string models. Unset fields are omitted from the request and
//! fields whose wire name is a Rust keyword (`from`, `where`) are renamed.

use serde::Serialize;
use serde_json::Value;

use crate::errors::{BrightcoveError, Result};
use crate::models::Validate;

/// Upper bound the CMS API accepts for `limit`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// `GET /videos` parameters.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct VideoQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    /// e.g. `-updated_at`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// CMS search syntax, e.g. `tags:nature +state:ACTIVE`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    /// Legacy search syntax. Prefer `q`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl VideoQuery {
    pub fn search(q: impl Into<String>) -> Self {
        Self {
            q: Some(q.into()),
            ..Self::default()
        }
    }
}

impl Validate for VideoQuery {
    fn validate(&self) -> Result<()> {
        match self.limit {
            Some(limit) if limit > MAX_PAGE_SIZE => Err(BrightcoveError::InvalidRequest(
                format!("limit must be less than or equal to {MAX_PAGE_SIZE}"),
            )),
            _ => Ok(()),
        }
    }
}

/// `GET /counts/videos` parameters.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct VideoCountQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl From<&VideoQuery> for VideoCountQuery {
    fn from(query: &VideoQuery) -> Self {
        Self { q: query.q.clone() }
    }
}

/// `GET /playlists` and `GET /counts/playlists` parameters.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct PlaylistQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
}

impl Validate for PlaylistQuery {
    fn validate(&self) -> Result<()> {
        match self.limit {
            Some(limit) if limit > MAX_PAGE_SIZE => Err(BrightcoveError::InvalidRequest(
                format!("limit must be less than or equal to {MAX_PAGE_SIZE}"),
            )),
            _ => Ok(()),
        }
    }
}

/// A date bound for analytics queries: epoch milliseconds or a string such
/// as `2024-01-01` or `-30d`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum DateBound {
    EpochMillis(i64),
    Text(String),
}

impl From<i64> for DateBound {
    fn from(ms: i64) -> Self {
        Self::EpochMillis(ms)
    }
}

impl From<&str> for DateBound {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for DateBound {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Json,
    Csv,
    Xlsx,
}

/// `GET /data` and `GET /data/status` parameters.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AnalyticsReportQuery {
    /// Comma-separated account ids.
    pub accounts: String,
    /// Comma-separated dimensions, e.g. `video,country`.
    pub dimensions: String,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ReportFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reconciled: Option<bool>,
}

impl AnalyticsReportQuery {
    pub fn new(accounts: impl Into<String>, dimensions: impl Into<String>) -> Self {
        Self {
            accounts: accounts.into(),
            dimensions: dimensions.into(),
            where_: None,
            limit: None,
            sort: None,
            offset: None,
            fields: None,
            from: None,
            to: None,
            format: None,
            reconciled: None,
        }
    }

    pub fn between(mut self, from: impl Into<DateBound>, to: impl Into<DateBound>) -> Self {
        self.from = Some(from.into());
        self.to = Some(to.into());
        self
    }

    pub fn filter(mut self, where_: impl Into<String>) -> Self {
        self.where_ = Some(where_.into());
        self
    }

    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}

impl Validate for AnalyticsReportQuery {
    fn validate(&self) -> Result<()> {
        require_non_empty("accounts", &self.accounts)?;
        require_non_empty("dimensions", &self.dimensions)
    }
}

/// `GET /timeseries/accounts/{account}` parameters for live streams.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LivestreamAnalyticsQuery {
    pub dimensions: String,
    /// Comma-separated metrics, e.g. `alive_ss_ad_start`.
    pub metrics: String,
    #[serde(rename = "where")]
    pub where_: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_limit: Option<u32>,
    /// e.g. `1h`, `5m`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<DateBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<DateBound>,
}

impl LivestreamAnalyticsQuery {
    pub fn new(
        dimensions: impl Into<String>,
        metrics: impl Into<String>,
        where_: impl Into<String>,
    ) -> Self {
        Self {
            dimensions: dimensions.into(),
            metrics: metrics.into(),
            where_: where_.into(),
            bucket_limit: None,
            bucket_duration: None,
            from: None,
            to: None,
        }
    }
}

impl Validate for LivestreamAnalyticsQuery {
    fn validate(&self) -> Result<()> {
        require_non_empty("dimensions", &self.dimensions)?;
        require_non_empty("metrics", &self.metrics)?;
        require_non_empty("where", &self.where_)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BrightcoveError::InvalidRequest(format!(
            "{field} is required"
        )));
    }
    Ok(())
}

/// Flatten a serializable query model into `(name, value)` pairs.
pub(crate) fn to_query_pairs<Q: Serialize + ?Sized>(query: &Q) -> Result<Vec<(String, String)>> {
    let value = serde_json::to_value(query)
        .map_err(|e| BrightcoveError::InvalidRequest(format!("unserializable query: {e}")))?;
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| scalar_to_string(v).map(|s| (k, s)))
            .collect()),
        other => Err(BrightcoveError::InvalidRequest(format!(
            "query parameters must be a map, got {other}"
        ))),
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs<Q: Serialize>(q: &Q) -> Vec<(String, String)> {
        to_query_pairs(q).unwrap()
    }

    fn get<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
        pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn unset_fields_are_omitted() {
        assert!(pairs(&VideoQuery::default()).is_empty());

        let q = VideoQuery {
            limit: Some(5),
            ..VideoQuery::default()
        };
        assert_eq!(pairs(&q), vec![("limit".to_string(), "5".to_string())]);
    }

    #[test]
    fn video_query_serializes_set_values() {
        let q = VideoQuery {
            limit: Some(10),
            offset: Some(20),
            q: Some("tags:nature".into()),
            ..VideoQuery::default()
        };
        let p = pairs(&q);
        assert_eq!(p.len(), 3);
        assert_eq!(get(&p, "limit"), Some("10"));
        assert_eq!(get(&p, "offset"), Some("20"));
        assert_eq!(get(&p, "q"), Some("tags:nature"));
    }

    #[test]
    fn analytics_aliases_use_wire_names() {
        let q = AnalyticsReportQuery::new("acc123", "video")
            .between("2024-01-01", "2024-12-31")
            .filter("video==12345");
        let q = AnalyticsReportQuery {
            format: Some(ReportFormat::Csv),
            reconciled: Some(true),
            ..q
        };
        let p = pairs(&q);
        assert_eq!(get(&p, "from"), Some("2024-01-01"));
        assert_eq!(get(&p, "to"), Some("2024-12-31"));
        assert_eq!(get(&p, "where"), Some("video==12345"));
        assert_eq!(get(&p, "format"), Some("csv"));
        assert_eq!(get(&p, "reconciled"), Some("true"));
        assert!(get(&p, "where_").is_none());
    }

    #[test]
    fn date_bound_accepts_epoch_millis() {
        let q = AnalyticsReportQuery::new("acc123", "video").between(1_704_067_200_000, "now");
        let p = pairs(&q);
        assert_eq!(get(&p, "from"), Some("1704067200000"));
        assert_eq!(get(&p, "to"), Some("now"));
    }

    #[test]
    fn analytics_requires_accounts_and_dimensions() {
        assert!(AnalyticsReportQuery::new("acc", "video").validate().is_ok());
        assert!(AnalyticsReportQuery::new("", "video").validate().is_err());
        assert!(AnalyticsReportQuery::new("acc", " ").validate().is_err());
    }

    #[test]
    fn livestream_query_serializes_buckets() {
        let q = LivestreamAnalyticsQuery {
            bucket_limit: Some(10),
            bucket_duration: Some("1h".into()),
            from: Some("2024-01-01".into()),
            ..LivestreamAnalyticsQuery::new("video", "alive_ss_ad_start", "video==123")
        };
        let p = pairs(&q);
        assert_eq!(get(&p, "bucket_limit"), Some("10"));
        assert_eq!(get(&p, "bucket_duration"), Some("1h"));
        assert_eq!(get(&p, "where"), Some("video==123"));
        assert!(q.validate().is_ok());
        assert!(LivestreamAnalyticsQuery::new("video", "", "video==1")
            .validate()
            .is_err());
    }

    #[test]
    fn page_size_over_limit_is_rejected() {
        let q = VideoQuery {
            limit: Some(101),
            ..VideoQuery::default()
        };
        assert!(q.validate().is_err());
        let q = VideoQuery {
            limit: Some(100),
            ..VideoQuery::default()
        };
        assert!(q.validate().is_ok());
    }

    #[test]
    fn count_query_keeps_search_filter() {
        let count = VideoCountQuery::from(&VideoQuery::search("state:ACTIVE"));
        assert_eq!(
            pairs(&count),
            vec![("q".to_string(), "state:ACTIVE".to_string())]
        );
    }
}
