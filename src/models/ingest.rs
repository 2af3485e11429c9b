//! Dynamic Ingest and Ingest Profiles schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{check_text, de, Validate};
use crate::errors::{BrightcoveError, Result};

// ---------------------------------------------------------------------------
// Dynamic Ingest
// ---------------------------------------------------------------------------

/// Temporary S3 credentials for uploading a source file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct S3UploadUrls {
    pub bucket: String,
    pub object_key: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Pre-signed URL a small file can be PUT to directly.
    #[serde(rename = "SignedUrl")]
    pub signed_url: String,
    /// URL to pass as the master `url` of the ingest request.
    #[serde(rename = "ApiRequestUrl")]
    pub api_request_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngestResponse {
    /// Ingest job id.
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTrackKind {
    Captions,
    Subtitles,
    Chapters,
    Metadata,
    Transcripts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    Published,
    Draft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionKind {
    Captions,
    Transcripts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageVariant {
    Poster,
    Thumbnail,
    Portrait,
    Square,
    Wide,
    UltraWide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LateBindingType {
    Cmaf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AudioTrackSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

/// The video source to transcode.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Master {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Retranscode from the stored digital master instead of `url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_archived_master: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub late_binding_type: Option<LateBindingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_tracks: Option<Vec<AudioTrackSpec>>,
}

impl Master {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    pub fn archived() -> Self {
        Self {
            use_archived_master: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestTextTrack {
    pub url: String,
    pub srclang: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TextTrackKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TrackStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embed_closed_caption: Option<bool>,
}

/// Auto-generated captions or transcripts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Transcription {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autodetect: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_audio_track: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<TranscriptionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub srclang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TrackStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Validate for Transcription {
    fn validate(&self) -> Result<()> {
        if self.autodetect == Some(true) && self.srclang.is_some() {
            return Err(BrightcoveError::InvalidRequest(
                "transcription srclang must be omitted when autodetect is true".into(),
            ));
        }
        match (self.kind, &self.url) {
            (Some(TranscriptionKind::Transcripts), None) => Err(BrightcoveError::InvalidRequest(
                "transcription url is required for transcripts".into(),
            )),
            (Some(TranscriptionKind::Captions), Some(_)) => Err(BrightcoveError::InvalidRequest(
                "transcription url is not allowed for captions".into(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTracks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge_with_existing: Option<bool>,
    pub masters: Vec<AudioTrackSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestImage {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<ImageVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

/// Poster or thumbnail source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSpec {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
}

impl ImageSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            height: None,
            width: None,
        }
    }
}

/// Body of `POST {account}/videos/{video}/ingest-requests`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master: Option<Master>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forensic_watermarking: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forensic_watermarking_stub_mode: Option<bool>,
    /// Ingest profile name; the account default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_tracks: Option<Vec<IngestTextTrack>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcriptions: Option<Vec<Transcription>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_tracks: Option<AudioTracks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<IngestImage>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<ImageSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<ImageSpec>,
    #[serde(rename = "capture-images", skip_serializing_if = "Option::is_none")]
    pub capture_images: Option<bool>,
    /// URLs notified as the job progresses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<Vec<String>>,
}

impl IngestRequest {
    /// Transcode the source at `url` with the account's default profile.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            master: Some(Master::from_url(url)),
            ..Self::default()
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn callback(mut self, url: impl Into<String>) -> Self {
        self.callbacks.get_or_insert_with(Vec::new).push(url.into());
        self
    }
}

impl Validate for IngestRequest {
    fn validate(&self) -> Result<()> {
        if let Some(master) = &self.master {
            if master.use_archived_master != Some(true) && master.url.is_none() {
                return Err(BrightcoveError::InvalidRequest(
                    "master.url is required unless use_archived_master is set".into(),
                ));
            }
            if let Some(url) = &master.url {
                check_text("master.url", url, 2048)?;
            }
        }
        if self.forensic_watermarking_stub_mode == Some(true)
            && self.forensic_watermarking != Some(true)
        {
            return Err(BrightcoveError::InvalidRequest(
                "forensic_watermarking_stub_mode requires forensic_watermarking".into(),
            ));
        }
        for track in self.text_tracks.iter().flatten() {
            check_text("text_tracks.url", &track.url, 2048)?;
            check_text("text_tracks.srclang", &track.srclang, 35)?;
        }
        for t in self.transcriptions.iter().flatten() {
            t.validate()?;
        }
        for image in self.images.iter().flatten() {
            check_text("images.url", &image.url, 2048)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ingest Profiles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalMasterSettings {
    pub rendition: String,
    pub distribute: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicOriginImage {
    pub label: String,
    pub height: u32,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicOrigin {
    pub renditions: Vec<String>,
    pub images: Vec<DynamicOriginImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestProfile {
    pub id: String,
    pub version: u32,
    pub name: String,
    pub display_name: String,
    pub description: String,
    #[serde(deserialize_with = "de::string_or_number")]
    pub account_id: String,
    pub brightcove_standard: bool,
    /// Epoch milliseconds.
    pub date_created: i64,
    pub date_last_modified: i64,
    pub digital_master: DigitalMasterSettings,
    #[serde(default)]
    pub renditions: Vec<Value>,
    #[serde(default)]
    pub packages: Vec<Value>,
    #[serde(default)]
    pub dynamic_origin: Option<DynamicOrigin>,
}

/// `GET accounts/{account}/configuration`: the account's default profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfileConfig {
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "de::opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub version: Option<u32>,
    pub default_profile_id: String,
    #[serde(default)]
    pub date_created: Option<i64>,
    #[serde(default)]
    pub date_last_modified: Option<i64>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn ingest_request_wire_shape() {
        let body = IngestRequest::from_url("https://example.com/v.mp4")
            .profile("multi-platform-standard-static")
            .priority(Priority::Low)
            .callback("https://example.com/cb");
        assert!(body.validate().is_ok());
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "master": {"url": "https://example.com/v.mp4"},
                "profile": "multi-platform-standard-static",
                "priority": "low",
                "callbacks": ["https://example.com/cb"]
            })
        );
    }

    #[test]
    fn capture_images_uses_hyphenated_name() {
        let body = IngestRequest {
            capture_images: Some(false),
            ..IngestRequest::default()
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"capture-images": false})
        );
    }

    #[test]
    fn master_needs_url_or_archive() {
        let body = IngestRequest {
            master: Some(Master::default()),
            ..IngestRequest::default()
        };
        assert!(body.validate().is_err());
        let body = IngestRequest {
            master: Some(Master::archived()),
            ..IngestRequest::default()
        };
        assert!(body.validate().is_ok());
    }

    #[test]
    fn stub_mode_requires_watermarking() {
        let mut body = IngestRequest::from_url("https://example.com/v.mp4");
        body.forensic_watermarking_stub_mode = Some(true);
        assert!(body.validate().is_err());
        body.forensic_watermarking = Some(true);
        assert!(body.validate().is_ok());
    }

    #[test]
    fn transcription_rules() {
        let auto_with_lang = Transcription {
            autodetect: Some(true),
            srclang: Some("en".into()),
            ..Transcription::default()
        };
        assert!(auto_with_lang.validate().is_err());

        let transcripts_without_url = Transcription {
            kind: Some(TranscriptionKind::Transcripts),
            ..Transcription::default()
        };
        assert!(transcripts_without_url.validate().is_err());

        let captions_with_url = Transcription {
            kind: Some(TranscriptionKind::Captions),
            url: Some("https://example.com/c.vtt".into()),
            ..Transcription::default()
        };
        assert!(captions_with_url.validate().is_err());

        let fine = Transcription {
            autodetect: Some(true),
            kind: Some(TranscriptionKind::Captions),
            ..Transcription::default()
        };
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn image_variant_names() {
        assert_eq!(
            serde_json::to_value(ImageVariant::UltraWide).unwrap(),
            json!("ultra-wide")
        );
    }

    #[test]
    fn s3_urls_parse_platform_casing() {
        let urls: S3UploadUrls = serde_json::from_value(json!({
            "bucket": "b", "object_key": "k", "access_key_id": "a",
            "secret_access_key": "s", "session_token": "t",
            "SignedUrl": "https://s3.example.com/put",
            "ApiRequestUrl": "s3://b/k"
        }))
        .unwrap();
        assert_eq!(urls.signed_url, "https://s3.example.com/put");
        assert_eq!(urls.api_request_url, "s3://b/k");
    }

    #[test]
    fn profile_parses_with_defaults() {
        let profile: IngestProfile = serde_json::from_value(json!({
            "id": "p1", "version": 1, "name": "multi-platform-standard-static",
            "display_name": "Standard", "description": "d", "account_id": 12345,
            "brightcove_standard": true, "date_created": 1, "date_last_modified": 2,
            "digital_master": {"rendition": "passthrough", "distribute": false}
        }))
        .unwrap();
        assert_eq!(profile.account_id, "12345");
        assert!(profile.renditions.is_empty());
        assert!(profile.dynamic_origin.is_none());
    }

    #[test]
    fn profile_missing_digital_master_is_rejected() {
        assert!(serde_json::from_value::<IngestProfile>(json!({
            "id": "p1", "version": 1, "name": "n", "display_name": "d",
            "description": "d", "account_id": 1, "brightcove_standard": true,
            "date_created": 1, "date_last_modified": 2
        }))
        .is_err());
    }
}
