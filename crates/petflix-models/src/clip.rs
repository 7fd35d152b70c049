//! Generated clip results.

use serde::{Deserialize, Serialize};

/// Clip duration in seconds, tagged by how it was obtained.
///
/// The generation API does not report the real duration of a finished
/// clip, so results start out `Estimated` (the requested duration). Once
/// the continuity extractor has probed the downloaded file, the value is
/// upgraded to `Measured`. Stitching needs this distinction: timeline
/// lengths built from estimates can drift from the real footage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "seconds", rename_all = "snake_case")]
pub enum ClipDuration {
    /// Probed from the actual media file
    Measured(f64),
    /// Assumed from the requested generation duration
    Estimated(f64),
}

impl ClipDuration {
    /// Duration in seconds regardless of precision tag.
    pub fn seconds(&self) -> f64 {
        match self {
            ClipDuration::Measured(s) | ClipDuration::Estimated(s) => *s,
        }
    }

    pub fn is_measured(&self) -> bool {
        matches!(self, ClipDuration::Measured(_))
    }
}

/// One finished clip: where the video lives and how long it runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipResult {
    /// URL (or local reference) of the generated video
    pub video_ref: String,
    /// Tagged duration, always > 0
    pub duration: ClipDuration,
}

impl ClipResult {
    pub fn new(video_ref: impl Into<String>, duration: ClipDuration) -> Self {
        Self {
            video_ref: video_ref.into(),
            duration,
        }
    }

    /// Replace an estimated duration with a measured one.
    ///
    /// A duration that is already measured is left alone.
    pub fn with_measured_duration(mut self, seconds: f64) -> Self {
        if !self.duration.is_measured() {
            self.duration = ClipDuration::Measured(seconds);
        }
        self
    }
}
