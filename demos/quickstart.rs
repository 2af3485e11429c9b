//! Quick-start examples for the Brightcove Rust client.
//!
//! Run with:
//!   BRIGHTCOVE_CLIENT_ID=... BRIGHTCOVE_CLIENT_SECRET=... BRIGHTCOVE_ACCOUNT_ID=... \
//!     cargo run --example quickstart -- path/to/video.mp4
//!
//! Set `RUST_LOG=brightcove=debug` to watch retries and token refreshes.

use std::time::Duration;

use brightcove::models::cms::{CreateVideoRequest, PollOptions, VideoState};
use brightcove::models::ingest::IngestRequest;
use brightcove::{Client, VideoCountQuery, VideoQuery};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> brightcove::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // -----------------------------------------------------------------------
    // 1. Create a client (reads BRIGHTCOVE_* from the environment)
    // -----------------------------------------------------------------------
    let client = Client::from_env()?;

    // Or provide credentials directly:
    // let client = Client::new(Credentials::new("client-id", "client-secret", "1234567"))?;

    // -----------------------------------------------------------------------
    // 2. Count and list videos
    // -----------------------------------------------------------------------
    let query = VideoQuery::search("+state:ACTIVE");
    let count = client.cms().get_video_count(&VideoCountQuery::from(&query)).await?;
    println!("Active videos: {}", count.count.unwrap_or(0));

    let all = client.cms().get_videos_for_account(100, None, &query).await?;
    for video in all.iter().take(10) {
        println!(
            "  {} | {}",
            video.id.as_deref().unwrap_or("-"),
            video.name.as_deref().unwrap_or("(untitled)")
        );
    }
    println!();

    // -----------------------------------------------------------------------
    // 3. Create a video, upload a source and wait for ingest
    // -----------------------------------------------------------------------
    let Some(source) = std::env::args().nth(1) else {
        println!("Pass a video file to also run the upload walkthrough.");
        return Ok(());
    };

    let video = client
        .cms()
        .create_video(
            &CreateVideoRequest::new("Quickstart upload")
                .state(VideoState::Inactive)
                .tags(["quickstart"]),
        )
        .await?;
    let video_id = video.id.unwrap_or_default();
    println!("Created video {video_id}");

    let master_url = client.dynamic_ingest().upload_source(&video_id, &source).await?;
    let job = client
        .dynamic_ingest()
        .ingest_videos_and_assets(&video_id, &IngestRequest::from_url(master_url))
        .await?;
    println!("Ingest job {} submitted", job.id);

    let opts = PollOptions {
        poll_interval: Duration::from_secs(10),
        timeout: Duration::from_secs(30 * 60),
        on_progress: Some(Box::new(|job| println!("  Status: {:?}", job.state))),
    };
    let job = client
        .cms()
        .wait_for_ingest_job(&video_id, &job.id, &opts)
        .await?;
    println!("Ingest finished: {:?}", job.state);

    // -----------------------------------------------------------------------
    // 4. Analytics for the account
    // -----------------------------------------------------------------------
    let report = client
        .analytics()
        .get_analytics_report(
            &client
                .analytics()
                .report("video")
                .fields("video,video_view")
                .between("-30d", "now"),
        )
        .await?;
    println!(
        "{} videos with views in the last 30 days ({} views total)",
        report.item_count,
        report.summary_metric("video_view").unwrap_or(0.0)
    );

    client.close();
    Ok(())
}
