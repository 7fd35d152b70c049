//! Render/stitch job state machine.

use serde::{Deserialize, Serialize};

/// Render job status reported by the stitching service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStatus {
    Submitted,
    Queued,
    Rendering,
    Saving,
    Done,
    Failed,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::Submitted => "submitted",
            RenderStatus::Queued => "queued",
            RenderStatus::Rendering => "rendering",
            RenderStatus::Saving => "saving",
            RenderStatus::Done => "done",
            RenderStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenderStatus::Done | RenderStatus::Failed)
    }
}

impl std::fmt::Display for RenderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a render job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderJob {
    /// Render id assigned by the stitching service
    pub id: String,
    pub status: RenderStatus,
    /// Final video URL, present once the job is done
    pub output_ref: Option<String>,
    pub error: Option<String>,
}

/// Supported output resolutions for the stitched video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Resolution {
    Sd,
    #[default]
    Hd,
    Full1080,
}

impl Resolution {
    /// Wire value expected by the render API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Sd => "sd",
            Resolution::Hd => "hd",
            Resolution::Full1080 => "1080",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(!RenderStatus::Submitted.is_terminal());
        assert!(!RenderStatus::Queued.is_terminal());
        assert!(!RenderStatus::Rendering.is_terminal());
        assert!(!RenderStatus::Saving.is_terminal());
        assert!(RenderStatus::Done.is_terminal());
        assert!(RenderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_status_wire_format() {
        let status: RenderStatus = serde_json::from_str("\"rendering\"").unwrap();
        assert_eq!(status, RenderStatus::Rendering);
    }

    #[test]
    fn test_resolution_wire_values() {
        assert_eq!(Resolution::Sd.as_str(), "sd");
        assert_eq!(Resolution::Hd.as_str(), "hd");
        assert_eq!(Resolution::Full1080.as_str(), "1080");
    }
}
