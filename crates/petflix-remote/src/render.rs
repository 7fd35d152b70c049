//! Client for the render/stitch API.
//!
//! Clips are laid out back to back on a single track; the service
//! concatenates them into one mp4. Polling is attempt-bounded rather
//! than wall-clock bounded because the service reports a stable status
//! ladder and each poll is cheap.

use std::time::Duration;

use petflix_models::{ClipResult, RenderJob, RenderStatus, Resolution};
use tracing::{debug, info, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::retry::RetryPolicy;
use crate::types::{
    RenderAsset, RenderClip, RenderEdit, RenderOutput, RenderStatusResponse, RenderTimeline,
    RenderTrack, SubmitRenderResponse,
};

/// Render API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Polls before giving up on an in-flight render
    pub max_poll_attempts: u32,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.shotstack.io/stage/render".to_string(),
            api_key: None,
            poll_interval: Duration::from_secs(3),
            max_poll_attempts: 40,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl RenderConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("RENDER_API_URL") {
            config.base_url = url;
        }
        config.api_key = std::env::var("RENDER_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        if let Some(secs) = std::env::var("RENDER_POLL_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(attempts) = std::env::var("RENDER_MAX_POLL_ATTEMPTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_poll_attempts = attempts;
        }
        config
    }
}

/// Build the single-track edit payload for a clip sequence.
///
/// Start offsets are cumulative, so estimated durations shift every
/// later clip; measured durations keep cuts clean.
pub fn build_timeline(clips: &[ClipResult], resolution: Resolution) -> RemoteResult<RenderEdit> {
    if clips.is_empty() {
        return Err(RemoteError::InvalidTimeline(
            "no clips to stitch".to_string(),
        ));
    }

    let mut track_clips = Vec::with_capacity(clips.len());
    let mut cursor = 0.0f64;
    for clip in clips {
        let length = clip.duration.seconds();
        if length <= 0.0 {
            return Err(RemoteError::InvalidTimeline(format!(
                "clip {} has non-positive duration {}",
                clip.video_ref, length
            )));
        }
        track_clips.push(RenderClip {
            asset: RenderAsset {
                asset_type: "video".to_string(),
                src: clip.video_ref.clone(),
            },
            start: cursor,
            length,
        });
        cursor += length;
    }

    Ok(RenderEdit {
        timeline: RenderTimeline {
            tracks: vec![RenderTrack { clips: track_clips }],
        },
        output: RenderOutput {
            format: "mp4".to_string(),
            resolution: resolution.as_str().to_string(),
        },
    })
}

/// HTTP client for the render API.
#[derive(Debug, Clone)]
pub struct RenderClient {
    http: reqwest::Client,
    config: RenderConfig,
}

impl RenderClient {
    pub fn new(config: RenderConfig) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn check_configuration(&self) -> RemoteResult<()> {
        self.api_key().map(|_| ())
    }

    fn api_key(&self) -> RemoteResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| RemoteError::MissingCredentials("RENDER_API_KEY".to_string()))
    }

    /// Submit an edit and return the render id.
    pub async fn submit(&self, edit: &RenderEdit) -> RemoteResult<String> {
        let api_key = self.api_key()?.to_string();

        let response = self
            .config
            .retry
            .run(|| async {
                let resp = self
                    .http
                    .post(&self.config.base_url)
                    .header("x-api-key", &api_key)
                    .json(edit)
                    .send()
                    .await?;

                let status = resp.status();
                if !status.is_success() {
                    let message = resp.text().await.unwrap_or_default();
                    return Err(RemoteError::RequestFailed {
                        status: status.as_u16(),
                        message,
                    });
                }
                let body: SubmitRenderResponse = resp.json().await?;
                Ok(body)
            })
            .await?;

        if !response.success {
            return Err(RemoteError::RenderSubmitFailed(
                response.message.unwrap_or_else(|| "unknown".to_string()),
            ));
        }
        let id = response
            .response
            .map(|b| b.id)
            .ok_or_else(|| RemoteError::RenderSubmitFailed("no render id returned".to_string()))?;

        info!(render_id = %id, "Render submitted");
        Ok(id)
    }

    /// Poll a render until it finishes or the attempt budget runs out.
    pub async fn poll(&self, render_id: &str) -> RemoteResult<String> {
        let api_key = self.api_key()?.to_string();
        let url = format!("{}/{}", self.config.base_url, render_id);

        for attempt in 1..=self.config.max_poll_attempts {
            match self.fetch_job(&url, &api_key, render_id).await {
                Ok(job) => match job.status {
                    RenderStatus::Done => {
                        return job.output_ref.ok_or_else(|| {
                            RemoteError::RenderFailed(
                                "render done but no output url".to_string(),
                            )
                        });
                    }
                    RenderStatus::Failed => {
                        return Err(RemoteError::RenderFailed(
                            job.error.unwrap_or_else(|| "unknown".to_string()),
                        ));
                    }
                    status => {
                        debug!(render_id, status = %status, attempt, "Render in flight");
                    }
                },
                Err(e) if e.is_retryable() => {
                    warn!(render_id, "Transient render poll failure: {}", e);
                }
                Err(e) => return Err(e),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }

        Err(RemoteError::RenderPollFailed(format!(
            "render {} not finished after {} polls",
            render_id, self.config.max_poll_attempts
        )))
    }

    /// One-shot render status lookup.
    pub async fn query(&self, render_id: &str) -> RemoteResult<RenderJob> {
        let api_key = self.api_key()?.to_string();
        let url = format!("{}/{}", self.config.base_url, render_id);
        self.fetch_job(&url, &api_key, render_id).await
    }

    /// Build, submit, and poll in one call; returns the stitched video URL.
    pub async fn stitch(
        &self,
        clips: &[ClipResult],
        resolution: Resolution,
    ) -> RemoteResult<String> {
        let edit = build_timeline(clips, resolution)?;
        let render_id = self.submit(&edit).await?;
        self.poll(&render_id).await
    }

    async fn fetch_job(&self, url: &str, api_key: &str, render_id: &str) -> RemoteResult<RenderJob> {
        let resp = self
            .http
            .get(url)
            .header("x-api-key", api_key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(RemoteError::RequestFailed {
                status: status.as_u16(),
                message,
            });
        }

        let body: RenderStatusResponse = resp.json().await?;
        let inner = body.response.ok_or_else(|| {
            RemoteError::InvalidResponse("render status missing response body".to_string())
        })?;

        Ok(RenderJob {
            id: render_id.to_string(),
            status: inner.status,
            output_ref: inner.url,
            error: inner.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petflix_models::ClipDuration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clip(src: &str, seconds: f64) -> ClipResult {
        ClipResult::new(src, ClipDuration::Measured(seconds))
    }

    fn test_config(base_url: String) -> RenderConfig {
        RenderConfig {
            base_url,
            api_key: Some("render-key".to_string()),
            poll_interval: Duration::from_millis(10),
            max_poll_attempts: 5,
            retry: RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
            },
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_timeline_starts_are_cumulative() {
        let clips = vec![
            clip("https://cdn/a.mp4", 4.0),
            clip("https://cdn/b.mp4", 5.5),
            clip("https://cdn/c.mp4", 3.2),
        ];
        let edit = build_timeline(&clips, Resolution::Hd).unwrap();

        let track = &edit.timeline.tracks[0];
        assert_eq!(track.clips.len(), 3);
        assert_eq!(track.clips[0].start, 0.0);
        assert_eq!(track.clips[1].start, 4.0);
        assert_eq!(track.clips[2].start, 9.5);
        assert_eq!(edit.output.format, "mp4");
        assert_eq!(edit.output.resolution, "hd");
    }

    #[test]
    fn test_timeline_rejects_empty_and_zero_length() {
        assert!(matches!(
            build_timeline(&[], Resolution::Hd),
            Err(RemoteError::InvalidTimeline(_))
        ));
        assert!(matches!(
            build_timeline(&[clip("https://cdn/a.mp4", 0.0)], Resolution::Hd),
            Err(RemoteError::InvalidTimeline(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_returns_render_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-api-key", "render-key"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "success": true,
                "response": {"id": "r-1"}
            })))
            .mount(&server)
            .await;

        let client = RenderClient::new(test_config(server.uri())).unwrap();
        let edit = build_timeline(&[clip("https://cdn/a.mp4", 4.0)], Resolution::Hd).unwrap();
        assert_eq!(client.submit(&edit).await.unwrap(), "r-1");
    }

    #[tokio::test]
    async fn test_submit_rejection_surfaces_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "message": "invalid timeline"
            })))
            .mount(&server)
            .await;

        let client = RenderClient::new(test_config(server.uri())).unwrap();
        let edit = build_timeline(&[clip("https://cdn/a.mp4", 4.0)], Resolution::Hd).unwrap();
        match client.submit(&edit).await.unwrap_err() {
            RemoteError::RenderSubmitFailed(msg) => assert_eq!(msg, "invalid timeline"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_walks_ladder_to_done() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "response": {"id": "r-1", "status": "rendering"}
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/r-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "response": {"id": "r-1", "status": "done", "url": "https://cdn/final.mp4"}
            })))
            .mount(&server)
            .await;

        let client = RenderClient::new(test_config(server.uri())).unwrap();
        let url = client.poll("r-1").await.unwrap();
        assert_eq!(url, "https://cdn/final.mp4");
    }

    #[tokio::test]
    async fn test_poll_failed_render_surfaces_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "response": {"id": "r-2", "status": "failed", "error": "bad source"}
            })))
            .mount(&server)
            .await;

        let client = RenderClient::new(test_config(server.uri())).unwrap();
        match client.poll("r-2").await.unwrap_err() {
            RemoteError::RenderFailed(msg) => assert_eq!(msg, "bad source"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_gives_up_after_attempt_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r-3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "response": {"id": "r-3", "status": "queued"}
            })))
            .mount(&server)
            .await;

        let client = RenderClient::new(test_config(server.uri())).unwrap();
        assert!(matches!(
            client.poll("r-3").await.unwrap_err(),
            RemoteError::RenderPollFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let mut config = test_config("http://127.0.0.1:1".to_string());
        config.api_key = None;
        let client = RenderClient::new(config).unwrap();
        assert!(matches!(
            client.check_configuration(),
            Err(RemoteError::MissingCredentials(_))
        ));
    }
}
