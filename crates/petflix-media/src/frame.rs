//! Last-frame extraction for scene continuity.
//!
//! Each generated clip's final frame seeds the next scene's generation
//! task so the subject carries across cuts. All scratch files live in a
//! per-extraction temp directory that is removed on every exit path.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use crate::download::download_clip;
use crate::error::{MediaError, MediaResult};
use crate::probe::measure_duration;

/// Seek this far before the end when grabbing the last frame; seeking
/// to the exact end can land past the final frame.
pub const LAST_FRAME_BACKOFF_SECS: f64 = 0.1;

/// Extracted continuity frame plus the measured clip duration, which
/// the caller feeds back into the stitch timeline.
#[derive(Debug, Clone)]
pub struct ContinuityFrame {
    /// JPEG frame as a base64 data URI, ready to pass as a seed image
    pub image_data_ref: String,
    /// Clip duration measured by FFprobe
    pub duration_seconds: f64,
}

/// Extracts the last frame of a clip via FFprobe + FFmpeg.
#[derive(Debug, Clone)]
pub struct ContinuityExtractor {
    http: reqwest::Client,
}

impl Default for ContinuityExtractor {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl ContinuityExtractor {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch the clip, measure it, and grab its final frame.
    ///
    /// `clip_ref` may be an http(s) URL or a local file path.
    pub async fn extract_last_frame(&self, clip_ref: &str) -> MediaResult<ContinuityFrame> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let scratch = TempDir::new()?;
        let clip_path = self.materialize(clip_ref, scratch.path()).await?;

        let duration = measure_duration(&clip_path).await?;
        let timestamp = frame_timestamp(duration);

        let frame_path = scratch.path().join("last_frame.jpg");
        let output = Command::new("ffmpeg")
            .arg("-ss")
            .arg(format!("{:.3}", timestamp))
            .arg("-i")
            .arg(&clip_path)
            .args(["-frames:v", "1", "-q:v", "2", "-y"])
            .arg(&frame_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MediaError::FfmpegFailed {
                message: format!("frame extraction failed for {}", clip_ref),
                stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
            });
        }

        let jpeg = tokio::fs::read(&frame_path).await?;
        if jpeg.is_empty() {
            return Err(MediaError::InvalidVideo(
                "FFmpeg produced an empty frame".to_string(),
            ));
        }

        debug!(clip_ref, duration, timestamp, "Continuity frame extracted");
        Ok(ContinuityFrame {
            image_data_ref: format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)),
            duration_seconds: duration,
        })
    }

    /// Resolve a clip ref to a local file inside `scratch`.
    async fn materialize(&self, clip_ref: &str, scratch: &Path) -> MediaResult<PathBuf> {
        if clip_ref.starts_with("http://") || clip_ref.starts_with("https://") {
            let dest = scratch.join("clip.mp4");
            download_clip(&self.http, clip_ref, &dest).await?;
            Ok(dest)
        } else {
            let path = PathBuf::from(clip_ref);
            if !path.exists() {
                return Err(MediaError::FileNotFound(path));
            }
            Ok(path)
        }
    }
}

/// Seek timestamp for the final frame of a clip of the given duration.
pub fn frame_timestamp(duration_seconds: f64) -> f64 {
    (duration_seconds - LAST_FRAME_BACKOFF_SECS).max(0.0)
}
