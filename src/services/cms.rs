use futures::future::try_join_all;
use tokio::time::Instant;
use tracing::{debug, info};

use super::{check_id, Endpoint};
use crate::dispatch::ApiRequest;
use crate::errors::{BrightcoveError, Result};
use crate::models::cms::{
    AudioTrack, Channel, ChannelAffiliate, Contract, Count, CreateVideoRequest, CustomField,
    DigitalMaster, ImageList, IngestJob, PollOptions, UpdateVideoRequest, Video, VideoList,
    VideoReferences, VideoShare, VideoSource, VideoVariant,
};
use crate::models::Validate;
use crate::params::{VideoCountQuery, VideoQuery, MAX_PAGE_SIZE};

/// Most ids `get_video_by_id` accepts in one call.
pub const MAX_VIDEO_IDS: usize = 10;

/// CMS API: videos, their sub-resources, custom fields and channels.
#[derive(Clone)]
pub struct Cms {
    endpoint: Endpoint,
}

impl Cms {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.endpoint
            .dispatch
            .send(ApiRequest::get(self.endpoint.account_url(path)))
            .await
    }

    // -----------------------------------------------------------------------
    // Videos
    // -----------------------------------------------------------------------

    /// One page of videos matching `query`.
    pub async fn get_videos(&self, query: &VideoQuery) -> Result<Vec<Video>> {
        query.validate()?;
        let request = ApiRequest::get(self.endpoint.account_url("videos")).query(query)?;
        let videos: VideoList = self.endpoint.dispatch.send(request).await?;
        Ok(videos.into_inner())
    }

    /// Number of videos matching `query.q`.
    pub async fn get_video_count(&self, query: &VideoCountQuery) -> Result<Count> {
        let request = ApiRequest::get(self.endpoint.account_url("counts/videos")).query(query)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn create_video(&self, body: &CreateVideoRequest) -> Result<Video> {
        body.validate()?;
        let request = ApiRequest::post(self.endpoint.account_url("videos")).json(body)?;
        self.endpoint.dispatch.send(request).await
    }

    /// Fetch up to [`MAX_VIDEO_IDS`] videos in one request. Ids may be plain
    /// video ids or `ref:{reference_id}`.
    pub async fn get_video_by_id<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<Video>> {
        if ids.is_empty() || ids.len() > MAX_VIDEO_IDS {
            return Err(BrightcoveError::InvalidRequest(format!(
                "between 1 and {MAX_VIDEO_IDS} video ids are required, got {}",
                ids.len()
            )));
        }
        let mut joined = Vec::with_capacity(ids.len());
        for id in ids {
            let id = id.as_ref();
            check_id("video_id", id)?;
            if id.contains(',') {
                return Err(BrightcoveError::InvalidRequest(format!(
                    "video id must not contain a comma: {id:?}"
                )));
            }
            joined.push(id);
        }
        let videos: VideoList = self.get(&format!("videos/{}", joined.join(","))).await?;
        Ok(videos.into_inner())
    }

    pub async fn update_video(&self, video_id: &str, body: &UpdateVideoRequest) -> Result<Video> {
        check_id("video_id", video_id)?;
        body.validate()?;
        let request = ApiRequest::patch(self.endpoint.account_url(&format!("videos/{video_id}")))
            .json(body)?;
        self.endpoint.dispatch.send(request).await
    }

    pub async fn delete_video(&self, video_id: &str) -> Result<()> {
        check_id("video_id", video_id)?;
        let request = ApiRequest::delete(self.endpoint.account_url(&format!("videos/{video_id}")));
        self.endpoint.dispatch.send_unit(request).await
    }

    /// Every video matching `query`, fetched `page_size` at a time.
    ///
    /// The matching videos are counted first; `number_of_pages` defaults to
    /// enough pages to cover that count. Pages are requested concurrently
    /// (still subject to the CMS rate limit) and returned in offset order.
    pub async fn get_videos_for_account(
        &self,
        page_size: u32,
        number_of_pages: Option<u32>,
        query: &VideoQuery,
    ) -> Result<Vec<Video>> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(BrightcoveError::InvalidRequest(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }

        let count = match self.get_video_count(&VideoCountQuery::from(query)).await?.count {
            Some(count) if count > 0 => count,
            _ => return Ok(Vec::new()),
        };
        let pages = number_of_pages
            .map(u64::from)
            .unwrap_or_else(|| count.div_ceil(u64::from(page_size)));
        debug!(count, pages, page_size, "paginating videos");

        let fetches = (0..pages).map(|page| {
            let mut page_query = query.clone();
            page_query.limit = Some(page_size);
            page_query.offset = u32::try_from(page * u64::from(page_size)).ok();
            async move { self.get_videos(&page_query).await }
        });
        let pages = try_join_all(fetches).await?;
        Ok(pages.into_iter().flatten().collect())
    }

    // -----------------------------------------------------------------------
    // Video sub-resources
    // -----------------------------------------------------------------------

    pub async fn get_video_sources(&self, video_id: &str) -> Result<Vec<VideoSource>> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/sources")).await
    }

    pub async fn get_video_images(&self, video_id: &str) -> Result<ImageList> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/images")).await
    }

    pub async fn get_video_variants(&self, video_id: &str) -> Result<Vec<VideoVariant>> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/variants")).await
    }

    pub async fn get_video_variant(&self, video_id: &str, language: &str) -> Result<VideoVariant> {
        check_id("video_id", video_id)?;
        check_id("language", language)?;
        self.get(&format!("videos/{video_id}/variants/{language}"))
            .await
    }

    pub async fn get_video_audio_tracks(&self, video_id: &str) -> Result<Vec<AudioTrack>> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/audio_tracks")).await
    }

    pub async fn get_video_audio_track(&self, video_id: &str, track_id: &str) -> Result<AudioTrack> {
        check_id("video_id", video_id)?;
        check_id("track_id", track_id)?;
        self.get(&format!("videos/{video_id}/audio_tracks/{track_id}"))
            .await
    }

    pub async fn get_digital_master_info(&self, video_id: &str) -> Result<DigitalMaster> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/digital_master")).await
    }

    /// Playlists that reference the video.
    pub async fn get_playlists_for_video(&self, video_id: &str) -> Result<VideoReferences> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/references")).await
    }

    pub async fn get_status_of_ingest_jobs(&self, video_id: &str) -> Result<Vec<IngestJob>> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/ingest_jobs")).await
    }

    pub async fn get_ingest_job_status(&self, video_id: &str, job_id: &str) -> Result<IngestJob> {
        check_id("video_id", video_id)?;
        check_id("job_id", job_id)?;
        self.get(&format!("videos/{video_id}/ingest_jobs/{job_id}"))
            .await
    }

    /// Affiliate shares of a video.
    pub async fn list_shares(&self, video_id: &str) -> Result<Vec<VideoShare>> {
        check_id("video_id", video_id)?;
        self.get(&format!("videos/{video_id}/shares")).await
    }

    /// Poll an ingest job until it finishes or fails.
    ///
    /// # Errors
    ///
    /// - [`BrightcoveError::Timeout`] if the job is still running after
    ///   `options.timeout`.
    /// - [`BrightcoveError::JobFailed`] if the job reaches `failed`.
    pub async fn wait_for_ingest_job(
        &self,
        video_id: &str,
        job_id: &str,
        options: &PollOptions,
    ) -> Result<IngestJob> {
        let deadline = Instant::now() + options.timeout;

        loop {
            let job = self.get_ingest_job_status(video_id, job_id).await?;

            if let Some(ref cb) = options.on_progress {
                cb(&job);
            }

            if job.is_failed() {
                let reason = job
                    .error_message
                    .as_deref()
                    .or(job.error_code.as_deref())
                    .unwrap_or("no reason given");
                return Err(BrightcoveError::JobFailed(format!(
                    "job {} for video {video_id}: {reason}",
                    job.id
                )));
            }

            if job.is_terminal() {
                info!(video_id, job_id, "ingest job finished");
                return Ok(job);
            }

            if Instant::now() >= deadline {
                return Err(BrightcoveError::Timeout(options.timeout));
            }

            debug!(video_id, job_id, state = ?job.state, "ingest job still running");
            tokio::time::sleep(options.poll_interval).await;
        }
    }

    // -----------------------------------------------------------------------
    // Account-level resources
    // -----------------------------------------------------------------------

    pub async fn get_custom_fields(&self) -> Result<Vec<CustomField>> {
        self.get("video_fields/custom_fields").await
    }

    pub async fn list_channels(&self) -> Result<Vec<Channel>> {
        self.get("channels").await
    }

    pub async fn get_channel_details(&self, channel: &str) -> Result<Channel> {
        check_id("channel", channel)?;
        self.get(&format!("channels/{channel}")).await
    }

    pub async fn list_channel_affiliates(&self, channel: &str) -> Result<Vec<ChannelAffiliate>> {
        check_id("channel", channel)?;
        self.get(&format!("channels/{channel}/members")).await
    }

    pub async fn list_contracts(&self, channel: &str) -> Result<Vec<Contract>> {
        check_id("channel", channel)?;
        self.get(&format!("channels/{channel}/contracts")).await
    }

    pub async fn get_contract(&self, channel: &str, contract: &str) -> Result<Contract> {
        check_id("channel", channel)?;
        check_id("contract", contract)?;
        self.get(&format!("channels/{channel}/contracts/{contract}"))
            .await
    }
}
