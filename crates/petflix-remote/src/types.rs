//! Wire types for the generation and render APIs.
//!
//! Field names follow the upstream JSON contracts exactly; the rest of the
//! workspace only sees the domain models from `petflix-models`.

use petflix_models::{RenderStatus, TaskState};
use serde::{Deserialize, Serialize};

// --- Generation API ---

#[derive(Debug, Serialize)]
pub struct CreateTaskRequest {
    pub model: String,
    /// Seed image first, optional reference images after
    pub images: Vec<String>,
    pub prompt: String,
    pub duration: u32,
    pub aspect_ratio: String,
    pub resolution: String,
    pub movement_amplitude: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskResponse {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub struct Creation {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskStatusResponse {
    pub state: String,
    #[serde(default)]
    pub creations: Option<Vec<Creation>>,
    #[serde(default)]
    pub err_code: Option<String>,
}

impl TaskStatusResponse {
    /// Map the upstream state string onto our task state machine.
    /// Unknown states read as still-processing rather than failing the poll.
    pub fn task_state(&self) -> TaskState {
        match self.state.as_str() {
            "created" => TaskState::Created,
            "queueing" => TaskState::Queued,
            "processing" => TaskState::Processing,
            "success" => TaskState::Succeeded,
            "failed" => TaskState::Failed,
            _ => TaskState::Processing,
        }
    }

    /// First downloadable clip URL, if the task produced one.
    pub fn first_creation_url(&self) -> Option<&str> {
        self.creations
            .as_deref()?
            .iter()
            .find_map(|c| c.url.as_deref())
    }
}

// --- Render API ---

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderAsset {
    #[serde(rename = "type")]
    pub asset_type: String,
    pub src: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderClip {
    pub asset: RenderAsset,
    pub start: f64,
    pub length: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderTrack {
    pub clips: Vec<RenderClip>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderTimeline {
    pub tracks: Vec<RenderTrack>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RenderOutput {
    pub format: String,
    pub resolution: String,
}

/// Full edit payload submitted to the render service.
#[derive(Debug, Serialize, Deserialize)]
pub struct RenderEdit {
    pub timeline: RenderTimeline,
    pub output: RenderOutput,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRenderBody {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitRenderResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub response: Option<SubmitRenderBody>,
}

#[derive(Debug, Deserialize)]
pub struct RenderStatusBody {
    pub id: String,
    pub status: RenderStatus,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenderStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub response: Option<RenderStatusBody>,
}
