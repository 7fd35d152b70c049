//! Client for the image-to-video generation API.
//!
//! One task per scene: submit the seed image plus prompt, then poll the
//! task until it reaches a terminal state or the polling window closes.
//! Transient failures inside the polling window are tolerated silently;
//! client errors abort immediately.

use std::time::Duration;

use petflix_models::{ClipDuration, ClipResult, GenerationTask, TaskState};
use tracing::{debug, info, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::retry::RetryPolicy;
use crate::types::{CreateTaskRequest, CreateTaskResponse, TaskStatusResponse};

/// Generation API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Requested clip length in seconds
    pub clip_duration_secs: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    /// Delay between status polls
    pub poll_interval: Duration,
    /// Wall-clock ceiling for one task's polling window
    pub max_poll_duration: Duration,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.vidu.com/ent/v2".to_string(),
            api_key: None,
            model: "vidu2.0".to_string(),
            clip_duration_secs: 4,
            aspect_ratio: "16:9".to_string(),
            resolution: "720p".to_string(),
            poll_interval: Duration::from_secs(8),
            max_poll_duration: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

impl GenerationConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("GENERATION_API_URL") {
            config.base_url = url;
        }
        config.api_key = std::env::var("GENERATION_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        if let Ok(model) = std::env::var("GENERATION_MODEL") {
            config.model = model;
        }
        if let Some(secs) = env_u64("CLIP_DURATION_SECS") {
            config.clip_duration_secs = secs as u32;
        }
        if let Some(secs) = env_u64("GENERATION_POLL_INTERVAL_SECS") {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("GENERATION_MAX_POLL_SECS") {
            config.max_poll_duration = Duration::from_secs(secs);
        }
        config
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// HTTP client for the generation API.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: reqwest::Client,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(config: GenerationConfig) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Fail fast if the API key is absent, before any remote call.
    pub fn check_configuration(&self) -> RemoteResult<()> {
        self.api_key().map(|_| ())
    }

    fn api_key(&self) -> RemoteResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| RemoteError::MissingCredentials("GENERATION_API_KEY".to_string()))
    }

    /// Lightweight reachability check. Any HTTP response counts as
    /// reachable; only transport failures do not.
    pub async fn probe_connectivity(&self) -> bool {
        match self.http.get(&self.config.base_url).send().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Generation API unreachable: {}", e);
                false
            }
        }
    }

    /// Submit a generation task and return its id.
    ///
    /// `seed_image` goes first in the image list; `reference_images`
    /// follow it for character consistency.
    pub async fn create_task(
        &self,
        prompt: &str,
        seed_image: &str,
        reference_images: &[String],
    ) -> RemoteResult<String> {
        let api_key = self.api_key()?.to_string();

        let mut images = Vec::with_capacity(1 + reference_images.len());
        images.push(seed_image.to_string());
        images.extend(reference_images.iter().cloned());

        let request = CreateTaskRequest {
            model: self.config.model.clone(),
            images,
            prompt: prompt.to_string(),
            duration: self.config.clip_duration_secs,
            aspect_ratio: self.config.aspect_ratio.clone(),
            resolution: self.config.resolution.clone(),
            movement_amplitude: "auto".to_string(),
        };

        let url = format!("{}/img2video", self.config.base_url);
        let response = self
            .config
            .retry
            .run(|| async {
                let resp = self
                    .http
                    .post(&url)
                    .header("Authorization", format!("Token {}", api_key))
                    .json(&request)
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
                let body: CreateTaskResponse = resp.json().await?;
                Ok(body)
            })
            .await?;

        info!(task_id = %response.task_id, "Generation task created");
        Ok(response.task_id)
    }

    /// Poll a task until it succeeds, fails, or the window closes.
    ///
    /// `on_progress` receives a monotone sub-progress in [0, 1]; it is
    /// held below 1.0 until the task actually succeeds.
    pub async fn poll_task<F>(&self, task_id: &str, mut on_progress: F) -> RemoteResult<ClipResult>
    where
        F: FnMut(f64),
    {
        let api_key = self.api_key()?.to_string();
        let url = format!("{}/tasks/{}/creations", self.config.base_url, task_id);
        let started = tokio::time::Instant::now();
        let mut last_reported = 0.0f64;

        loop {
            let elapsed = started.elapsed();
            if elapsed >= self.config.max_poll_duration {
                return Err(RemoteError::Timeout(self.config.max_poll_duration.as_secs()));
            }

            let sub = (elapsed.as_secs_f64() / self.config.max_poll_duration.as_secs_f64())
                .clamp(0.0, 0.99);
            if sub > last_reported {
                last_reported = sub;
                on_progress(sub);
            }

            match self.fetch_status(&url, &api_key).await {
                Ok(status) => match status.task_state() {
                    TaskState::Succeeded => {
                        let video_ref = status.first_creation_url().ok_or_else(|| {
                            RemoteError::InvalidResponse(
                                "task succeeded without a creation url".to_string(),
                            )
                        })?;
                        on_progress(1.0);
                        return Ok(ClipResult::new(
                            video_ref,
                            ClipDuration::Estimated(self.config.clip_duration_secs as f64),
                        ));
                    }
                    TaskState::Failed => {
                        return Err(RemoteError::GenerationFailed(
                            status.err_code.unwrap_or_else(|| "unknown".to_string()),
                        ));
                    }
                    state => {
                        debug!(task_id, state = %state, "Task still in flight");
                    }
                },
                Err(e) if e.is_retryable() => {
                    warn!(task_id, "Transient poll failure, will retry: {}", e);
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// One-shot task status lookup, without polling.
    pub async fn query_task(&self, task_id: &str) -> RemoteResult<GenerationTask> {
        let api_key = self.api_key()?.to_string();
        let url = format!("{}/tasks/{}/creations", self.config.base_url, task_id);
        let status = self.fetch_status(&url, &api_key).await?;

        let state = status.task_state();
        let result = if state == TaskState::Succeeded {
            status.first_creation_url().map(|video_ref| {
                ClipResult::new(
                    video_ref,
                    ClipDuration::Estimated(self.config.clip_duration_secs as f64),
                )
            })
        } else {
            None
        };

        Ok(GenerationTask {
            id: task_id.to_string(),
            state,
            result,
            error: status.err_code,
        })
    }

    async fn fetch_status(&self, url: &str, api_key: &str) -> RemoteResult<TaskStatusResponse> {
        let resp = self
            .http
            .get(url)
            .header("Authorization", format!("Token {}", api_key))
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
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> GenerationConfig {
        GenerationConfig {
            base_url,
            api_key: Some("test-key".to_string()),
            poll_interval: Duration::from_millis(10),
            max_poll_duration: Duration::from_millis(500),
            retry: RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(1),
            },
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_create_task_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/img2video"))
            .and(header("Authorization", "Token test-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": "t-1"})),
            )
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let id = client
            .create_task("a cat in a castle", "data:image/jpeg;base64,AAAA", &[])
            .await
            .unwrap();
        assert_eq!(id, "t-1");
    }

    #[tokio::test]
    async fn test_create_task_client_error_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/img2video"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let err = client
            .create_task("prompt", "image", &[])
            .await
            .unwrap_err();
        match err {
            RemoteError::RequestFailed { status: 401, .. } => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_task_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/img2video"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/img2video"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"task_id": "t-2"})),
            )
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let id = client.create_task("prompt", "image", &[]).await.unwrap();
        assert_eq!(id, "t-2");
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_any_request() {
        let mut config = test_config("http://127.0.0.1:1".to_string());
        config.api_key = None;
        let client = GenerationClient::new(config).unwrap();

        assert!(matches!(
            client.check_configuration(),
            Err(RemoteError::MissingCredentials(_))
        ));
        assert!(matches!(
            client.create_task("p", "i", &[]).await,
            Err(RemoteError::MissingCredentials(_))
        ));
    }

    #[tokio::test]
    async fn test_poll_task_success_yields_clip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-1/creations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "success",
                "creations": [{"url": "https://cdn/clip-1.mp4"}]
            })))
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let mut reports = Vec::new();
        let clip = client
            .poll_task("t-1", |p| reports.push(p))
            .await
            .unwrap();

        assert_eq!(clip.video_ref, "https://cdn/clip-1.mp4");
        assert!(!clip.duration.is_measured());
        assert_eq!(reports.last().copied(), Some(1.0));
    }

    #[tokio::test]
    async fn test_poll_task_failure_surfaces_error_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-9/creations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "failed",
                "err_code": "content_policy"
            })))
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let err = client.poll_task("t-9", |_| {}).await.unwrap_err();
        match err {
            RemoteError::GenerationFailed(code) => assert_eq!(code, "content_policy"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_poll_task_times_out_when_never_terminal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-slow/creations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "processing"})),
            )
            .mount(&server)
            .await;

        let mut config = test_config(server.uri());
        config.max_poll_duration = Duration::from_millis(50);
        let client = GenerationClient::new(config).unwrap();

        let err = client.poll_task("t-slow", |_| {}).await.unwrap_err();
        assert!(matches!(err, RemoteError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_poll_task_tolerates_transient_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-3/creations"))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-3/creations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "state": "success",
                "creations": [{"url": "https://cdn/clip-3.mp4"}]
            })))
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let clip = client.poll_task("t-3", |_| {}).await.unwrap();
        assert_eq!(clip.video_ref, "https://cdn/clip-3.mp4");
    }

    #[tokio::test]
    async fn test_poll_progress_is_monotone_and_capped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-4/creations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "processing"})),
            )
            .mount(&server)
            .await;

        let mut config = test_config(server.uri());
        config.max_poll_duration = Duration::from_millis(100);
        let client = GenerationClient::new(config).unwrap();

        let mut reports = Vec::new();
        let _ = client.poll_task("t-4", |p| reports.push(p)).await;

        assert!(reports.windows(2).all(|w| w[0] < w[1]));
        assert!(reports.iter().all(|p| *p <= 0.99));
    }

    #[tokio::test]
    async fn test_query_task_maps_states() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t-5/creations"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"state": "queueing"})),
            )
            .mount(&server)
            .await;

        let client = GenerationClient::new(test_config(server.uri())).unwrap();
        let task = client.query_task("t-5").await.unwrap();
        assert_eq!(task.state, TaskState::Queued);
        assert!(task.result.is_none());
    }
}
