//! Social syndication (MRSS feed) schemas.

use serde::{Deserialize, Serialize};

use super::{check_text, Validate};
use crate::errors::{BrightcoveError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyndicationType {
    Advanced,
    Google,
    Iphone,
    Ipad,
    Mp4,
    Itunes,
    Roku,
    Source,
    Universal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Explicit {
    Yes,
    No,
    Clean,
}

/// A syndication feed. Also used as the create/update body, where `id` and
/// the server-populated URLs are left unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyndicationFeed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SyndicationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_all_content: Option<bool>,
    /// CMS search expression selecting feed content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_filter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub syndication_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explicit: Option<Explicit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_digital_master: Option<bool>,
}

impl SyndicationFeed {
    pub fn new(name: impl Into<String>, kind: SyndicationType) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            include_all_content: None,
            include_filter: None,
            title: None,
            description: None,
            destination_url: None,
            syndication_url: None,
            content_type_header: None,
            language: None,
            explicit: None,
            author: None,
            category: None,
            album_art_url: None,
            fetch_digital_master: None,
        }
    }
}

impl Validate for SyndicationFeed {
    fn validate(&self) -> Result<()> {
        check_text("name", &self.name, 255)?;
        if self.include_all_content == Some(true) && self.include_filter.is_some() {
            return Err(BrightcoveError::InvalidRequest(
                "include_filter has no effect when include_all_content is true".into(),
            ));
        }
        Ok(())
    }
}
