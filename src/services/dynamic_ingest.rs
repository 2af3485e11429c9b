use std::path::Path;

use reqwest::header::CONTENT_TYPE;
use tracing::info;

use super::{check_id, Endpoint};
use crate::dispatch::ApiRequest;
use crate::errors::{BrightcoveError, ClientErrorKind, Result};
use crate::models::ingest::{IngestRequest, IngestResponse, S3UploadUrls};
use crate::models::Validate;

/// Dynamic Ingest API: submit sources and assets for transcoding.
#[derive(Clone)]
pub struct DynamicIngest {
    endpoint: Endpoint,
}

impl DynamicIngest {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Start an ingest job for an existing video. Returns the job id, which
    /// [`Cms::wait_for_ingest_job`](crate::services::Cms::wait_for_ingest_job)
    /// can poll.
    pub async fn ingest_videos_and_assets(
        &self,
        video_id: &str,
        body: &IngestRequest,
    ) -> Result<IngestResponse> {
        check_id("video_id", video_id)?;
        body.validate()?;
        let url = self
            .endpoint
            .account_url(&format!("videos/{video_id}/ingest-requests"));
        self.endpoint
            .dispatch
            .send(ApiRequest::post(url).json(body)?)
            .await
    }

    /// Temporary S3 location to upload `source_name` to.
    pub async fn get_temporary_s3_urls(
        &self,
        video_id: &str,
        source_name: &str,
    ) -> Result<S3UploadUrls> {
        check_id("video_id", video_id)?;
        check_id("source_name", source_name)?;
        let url = self
            .endpoint
            .account_url(&format!("videos/{video_id}/upload-urls/{source_name}"));
        self.endpoint.dispatch.send(ApiRequest::get(url)).await
    }

    /// Upload a local file as a source for `video_id`.
    ///
    /// This performs two HTTP calls:
    /// 1. `GET upload-urls` to obtain a signed S3 URL.
    /// 2. `PUT` the file to that URL.
    ///
    /// Returns the `ApiRequestUrl` to use as the master `url` of an
    /// [`IngestRequest`]. The whole file is read into memory, so this suits
    /// files small enough for a single PUT.
    pub async fn upload_source(&self, video_id: &str, path: impl AsRef<Path>) -> Result<String> {
        let path = path.as_ref();
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                BrightcoveError::InvalidRequest(format!("{} has no file name", path.display()))
            })?;

        let file_bytes = tokio::fs::read(path).await?;
        let urls = self.get_temporary_s3_urls(video_id, &source_name).await?;

        // The signed URL carries credentials, so errors never echo it back.
        let endpoint = format!("S3 upload of {source_name}");
        let upload_resp = self
            .endpoint
            .dispatch
            .http()
            .put(&urls.signed_url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(file_bytes)
            .send()
            .await
            .map_err(|e| BrightcoveError::Network {
                endpoint: endpoint.clone(),
                source: e.without_url(),
            })?;

        if !upload_resp.status().is_success() {
            let status = upload_resp.status();
            let body = upload_resp
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e.without_url()));
            return Err(if status.is_client_error() {
                BrightcoveError::Client {
                    status: status.as_u16(),
                    kind: ClientErrorKind::from_status(status.as_u16()),
                    endpoint,
                    body,
                }
            } else {
                BrightcoveError::Server {
                    status: status.as_u16(),
                    endpoint,
                    body,
                }
            });
        }

        info!(video_id, source_name, "uploaded source to S3");
        Ok(urls.api_request_url)
    }
}
