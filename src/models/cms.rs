//! CMS API schemas: videos and their sub-resources, playlists, channels.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{check_len, check_opt_len, check_text, de, Validate};
use crate::errors::{BrightcoveError, Result};

const MAX_NAME: usize = 255;
const MAX_DESCRIPTION: usize = 250;
const MAX_LONG_DESCRIPTION: usize = 5000;
const MAX_REFERENCE_ID: usize = 150;
const MAX_TAG: usize = 128;
const MAX_TAGS: usize = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoState {
    Active,
    Inactive,
    Pending,
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Economics {
    AdSupported,
    Free,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geo {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_countries: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricted: Option<bool>,
}

/// Availability window. ISO 8601.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starts_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuePoint {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// `AD`, `CODE` or `TEXT`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Seconds from video start.
    pub time: f64,
    #[serde(default)]
    pub metadata: Option<String>,
    #[serde(default)]
    pub force_stop: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ImageSource {
    pub src: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Image {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub asset_id: Option<String>,
    pub src: String,
    #[serde(default)]
    pub sources: Vec<ImageSource>,
}

/// Images keyed by kind: `poster`, `thumbnail`, `wide`, ...
pub type ImageList = BTreeMap<String, Image>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextTrack {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub srclang: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub default: Option<bool>,
}

/// A CMS video. Every field is optional because the API omits fields it has
/// no value for and partial projections (`fields=`) are common.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Video {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default)]
    pub state: Option<VideoState>,
    #[serde(default)]
    pub economics: Option<Economics>,
    #[serde(default)]
    pub complete: Option<bool>,
    #[serde(default)]
    pub ad_keys: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
    #[serde(default)]
    pub images: Option<ImageList>,
    #[serde(default)]
    pub geo: Option<Geo>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub link: Option<Link>,
    #[serde(default)]
    pub cue_points: Vec<CuePoint>,
    #[serde(default)]
    pub text_tracks: Vec<TextTrack>,
    #[serde(default)]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    /// `static_origin`, `dynamic_origin`, `live_origin`, ...
    #[serde(default)]
    pub delivery_type: Option<String>,
    #[serde(default)]
    pub has_digital_master: Option<bool>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub digital_master_id: Option<String>,
    #[serde(default)]
    pub projection: Option<String>,
    #[serde(default)]
    pub playback_rights_id: Option<String>,
    #[serde(default)]
    pub offline_enabled: Option<bool>,
    #[serde(default)]
    pub drm_disabled: Option<bool>,
}

impl Video {
    pub fn is_active(&self) -> bool {
        self.state == Some(VideoState::Active)
    }
}

/// Responses that may hold one video or several.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoList(pub Vec<Video>);

impl<'de> Deserialize<'de> for VideoList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        de::one_or_many(deserializer).map(Self)
    }
}

impl VideoList {
    pub fn into_inner(self) -> Vec<Video> {
        self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Count {
    #[serde(default)]
    pub count: Option<u64>,
}

/// Optional metadata shared by create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<VideoState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub economics: Option<Economics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo: Option<Geo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_keys: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
}

impl Validate for VideoMetadata {
    fn validate(&self) -> Result<()> {
        check_opt_len("description", self.description.as_ref(), MAX_DESCRIPTION)?;
        check_opt_len(
            "long_description",
            self.long_description.as_ref(),
            MAX_LONG_DESCRIPTION,
        )?;
        check_opt_len("reference_id", self.reference_id.as_ref(), MAX_REFERENCE_ID)?;
        if matches!(self.state, Some(VideoState::Pending | VideoState::Deleted)) {
            return Err(BrightcoveError::InvalidRequest(
                "state can only be set to ACTIVE or INACTIVE".into(),
            ));
        }
        if let Some(tags) = &self.tags {
            if tags.len() > MAX_TAGS {
                return Err(BrightcoveError::InvalidRequest(format!(
                    "a video can have at most {MAX_TAGS} tags"
                )));
            }
            for tag in tags {
                check_len("tag", tag, MAX_TAG)?;
            }
        }
        Ok(())
    }
}

/// `POST /videos` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateVideoRequest {
    pub name: String,
    #[serde(flatten)]
    pub metadata: VideoMetadata,
}

impl CreateVideoRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: VideoMetadata::default(),
        }
    }

    pub fn state(mut self, state: VideoState) -> Self {
        self.metadata.state = Some(state);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.metadata.description = Some(description.into());
        self
    }

    pub fn reference_id(mut self, reference_id: impl Into<String>) -> Self {
        self.metadata.reference_id = Some(reference_id.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metadata.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }
}

impl Validate for CreateVideoRequest {
    fn validate(&self) -> Result<()> {
        check_text("name", &self.name, MAX_NAME)?;
        self.metadata.validate()
    }
}

/// `PATCH /videos/{id}` body. Only set fields are changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateVideoRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub metadata: VideoMetadata,
}

impl Validate for UpdateVideoRequest {
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_text("name", name, MAX_NAME)?;
        }
        self.metadata.validate()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoSource {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default, rename = "type")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub codec: Option<String>,
    /// Bits per second.
    #[serde(default)]
    pub encoding_rate: Option<u64>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub width: Option<u32>,
    /// Bytes.
    #[serde(default)]
    pub size: Option<u64>,
    /// Milliseconds.
    #[serde(default)]
    pub duration: Option<u64>,
}

/// A language variant of a video's metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoVariant {
    pub language: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub long_description: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioTrack {
    pub id: String,
    #[serde(default)]
    pub language: Option<String>,
    /// `main`, `alternate`, `commentary`, `dub` or `descriptive`.
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub encoding_rates: Vec<u64>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DigitalMaster {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub duration: Option<u64>,
    #[serde(default)]
    pub encoding_rate: Option<u64>,
}

/// `GET /videos/{id}/references`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VideoReferences {
    #[serde(default)]
    pub playlists: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestJobState {
    Processing,
    Publishing,
    Published,
    Finished,
    Failed,
}

/// Status of a dynamic-ingest job as seen by the CMS.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IngestJob {
    pub id: String,
    pub state: IngestJobState,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub video_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl IngestJob {
    /// Terminal = won't change anymore (`finished` or `failed`).
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, IngestJobState::Finished | IngestJobState::Failed)
    }

    pub fn is_failed(&self) -> bool {
        self.state == IngestJobState::Failed
    }
}

/// Polling config for `wait_for_ingest_job`.
pub struct PollOptions {
    /// Default: 5s.
    pub poll_interval: Duration,
    /// Default: 1h.
    pub timeout: Duration,
    /// Called on each poll iteration with the current job.
    #[allow(clippy::type_complexity)]
    pub on_progress: Option<Box<dyn Fn(&IngestJob) + Send + Sync>>,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(60 * 60),
            on_progress: None,
        }
    }
}

/// An affiliate share of a video.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoShare {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub affiliate_video_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub shared_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// `string` or `enum`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub enum_values: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Channel {
    #[serde(deserialize_with = "de::string_or_number")]
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChannelAffiliate {
    #[serde(deserialize_with = "de::string_or_number")]
    pub account_id: String,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub auto_accept: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contract {
    #[serde(deserialize_with = "de::string_or_number")]
    pub account_id: String,
    #[serde(default)]
    pub channel_name: Option<String>,
    #[serde(default)]
    pub approved: Option<bool>,
    #[serde(default)]
    pub auto_accept: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaylistType {
    Explicit,
    ActivatedOldestToNewest,
    ActivatedNewestToOldest,
    Alphabetical,
    PlaysTotal,
    PlaysTrailingWeek,
    StartDateOldestToNewest,
    StartDateNewestToOldest,
}

impl PlaylistType {
    /// Smart playlists select videos by search instead of an id list.
    pub fn is_smart(self) -> bool {
        self != Self::Explicit
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Playlist {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub account_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub reference_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<PlaylistType>,
    #[serde(default)]
    pub favorite: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub video_ids: Vec<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// `POST /playlists` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PlaylistType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    /// Explicit playlists only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_ids: Option<Vec<String>>,
    /// Smart playlists only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl CreatePlaylistRequest {
    pub fn explicit<I, S>(name: impl Into<String>, video_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: PlaylistType::Explicit,
            description: None,
            reference_id: None,
            favorite: None,
            video_ids: Some(video_ids.into_iter().map(Into::into).collect()),
            search: None,
            limit: None,
        }
    }

    pub fn smart(name: impl Into<String>, kind: PlaylistType, search: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            reference_id: None,
            favorite: None,
            video_ids: None,
            search: Some(search.into()),
            limit: None,
        }
    }
}

impl Validate for CreatePlaylistRequest {
    fn validate(&self) -> Result<()> {
        check_text("name", &self.name, MAX_NAME)?;
        check_opt_len("description", self.description.as_ref(), MAX_DESCRIPTION)?;
        check_opt_len("reference_id", self.reference_id.as_ref(), MAX_REFERENCE_ID)?;
        if self.kind.is_smart() && self.video_ids.is_some() {
            return Err(BrightcoveError::InvalidRequest(
                "video_ids can only be set on EXPLICIT playlists".into(),
            ));
        }
        if !self.kind.is_smart() && self.search.is_some() {
            return Err(BrightcoveError::InvalidRequest(
                "search can only be set on smart playlists".into(),
            ));
        }
        Ok(())
    }
}

/// `PATCH /playlists/{id}` body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdatePlaylistRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_ids: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Validate for UpdatePlaylistRequest {
    fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            check_text("name", name, MAX_NAME)?;
        }
        check_opt_len("description", self.description.as_ref(), MAX_DESCRIPTION)?;
        check_opt_len("reference_id", self.reference_id.as_ref(), MAX_REFERENCE_ID)?;
        if self.video_ids.is_some() && self.search.is_some() {
            return Err(BrightcoveError::InvalidRequest(
                "a playlist takes either video_ids or search, not both".into(),
            ));
        }
        Ok(())
    }
}
