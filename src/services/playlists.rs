use serde_json::json;

use super::{check_id, Endpoint};
use crate::dispatch::ApiRequest;
use crate::errors::Result;
use crate::models::cms::{
    Count, CreatePlaylistRequest, Playlist, UpdatePlaylistRequest, Video, VideoList,
};
use crate::models::Validate;
use crate::params::PlaylistQuery;

/// CMS playlists. Shares the CMS base URL and rate limit.
#[derive(Clone)]
pub struct Playlists {
    endpoint: Endpoint,
}

impl Playlists {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub async fn list_playlists(&self, query: &PlaylistQuery) -> Result<Vec<Playlist>> {
        query.validate()?;
        let request = ApiRequest::get(self.endpoint.account_url("playlists")).query(query)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn get_playlist_count(&self, query: &PlaylistQuery) -> Result<Count> {
        let request = ApiRequest::get(self.endpoint.account_url("counts/playlists"))
            .query(&json!({ "q": query.q }))?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn get_playlist(&self, playlist_id: &str) -> Result<Playlist> {
        check_id("playlist_id", playlist_id)?;
        let url = self.endpoint.account_url(&format!("playlists/{playlist_id}"));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    pub async fn create_playlist(&self, body: &CreatePlaylistRequest) -> Result<Playlist> {
        body.validate()?;
        let request = ApiRequest::post(self.endpoint.account_url("playlists")).json(body)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn update_playlist(
        &self,
        playlist_id: &str,
        body: &UpdatePlaylistRequest,
    ) -> Result<Playlist> {
        check_id("playlist_id", playlist_id)?;
        body.validate()?;
        let url = self.endpoint.account_url(&format!("playlists/{playlist_id}"));
        self.endpoint
            .dispatch
            .send(ApiRequest::patch(url).json(body)?)
            .await
    }

    pub async fn delete_playlist(&self, playlist_id: &str) -> Result<()> {
        check_id("playlist_id", playlist_id)?;
        let url = self.endpoint.account_url(&format!("playlists/{playlist_id}"));
        self.endpoint.dispatch.send_unit(ApiRequest::delete(url)).await
    }

    /// Videos in the playlist, in playlist order.
    pub async fn get_playlist_videos(&self, playlist_id: &str) -> Result<Vec<Video>> {
        check_id("playlist_id", playlist_id)?;
        let url = self
            .endpoint
            .account_url(&format!("playlists/{playlist_id}/videos"));
        let videos: VideoList = self.endpoint.dispatch.send(ApiRequest::get(url)).await?;
        Ok(videos.into_inner())
    }

    pub async fn get_playlist_video_count(&self, playlist_id: &str) -> Result<Count> {
        check_id("playlist_id", playlist_id)?;
        let url = self
            .endpoint
            .account_url(&format!("counts/playlists/{playlist_id}/videos"));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }
}
