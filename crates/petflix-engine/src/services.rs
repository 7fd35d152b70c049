//! Service seams between the orchestrator and the outside world.
//!
//! The orchestrator only sees these traits; the production impls wrap
//! the HTTP clients and the FFmpeg extractor, and tests substitute
//! in-memory fakes.

use async_trait::async_trait;
use petflix_media::{ContinuityExtractor, ContinuityFrame};
use petflix_models::{ClipResult, Resolution};
use petflix_remote::{GenerationClient, RenderClient};

use crate::error::EngineResult;

/// Produces one clip per scene from a prompt and a seed image.
#[async_trait]
pub trait ClipGenerator: Send + Sync {
    /// Fail fast when credentials are absent, before any remote call.
    fn ensure_configured(&self) -> EngineResult<()>;

    /// Whether the service answers at all right now.
    async fn is_reachable(&self) -> bool;

    /// Generate one clip. `on_progress` receives sub-progress in [0, 1].
    async fn generate(
        &self,
        prompt: &str,
        seed_image: &str,
        reference_images: &[String],
        on_progress: &(dyn Fn(f64) + Send + Sync),
    ) -> EngineResult<ClipResult>;
}

/// Concatenates finished clips into one video.
#[async_trait]
pub trait Stitcher: Send + Sync {
    fn ensure_configured(&self) -> EngineResult<()>;

    /// Returns the URL of the stitched video.
    async fn stitch(&self, clips: &[ClipResult], resolution: Resolution) -> EngineResult<String>;
}

/// Supplies the seed images: the inlined user photo for the first
/// scene and the continuity frame between consecutive scenes.
#[async_trait]
pub trait SeedFrameSource: Send + Sync {
    /// Turn the user's photo reference into an embeddable image ref.
    async fn inline_source_image(&self, image_ref: &str) -> EngineResult<String>;

    async fn extract_last_frame(&self, clip_ref: &str) -> EngineResult<ContinuityFrame>;
}

#[async_trait]
impl ClipGenerator for GenerationClient {
    fn ensure_configured(&self) -> EngineResult<()> {
        Ok(self.check_configuration()?)
    }

    async fn is_reachable(&self) -> bool {
        self.probe_connectivity().await
    }

    async fn generate(
        &self,
        prompt: &str,
        seed_image: &str,
        reference_images: &[String],
        on_progress: &(dyn Fn(f64) + Send + Sync),
    ) -> EngineResult<ClipResult> {
        let task_id = self.create_task(prompt, seed_image, reference_images).await?;
        Ok(self.poll_task(&task_id, |p| on_progress(p)).await?)
    }
}

#[async_trait]
impl Stitcher for RenderClient {
    fn ensure_configured(&self) -> EngineResult<()> {
        Ok(self.check_configuration()?)
    }

    async fn stitch(&self, clips: &[ClipResult], resolution: Resolution) -> EngineResult<String> {
        Ok(RenderClient::stitch(self, clips, resolution).await?)
    }
}

#[async_trait]
impl SeedFrameSource for ContinuityExtractor {
    async fn inline_source_image(&self, image_ref: &str) -> EngineResult<String> {
        Ok(petflix_media::inline_image_ref(image_ref).await?)
    }

    async fn extract_last_frame(&self, clip_ref: &str) -> EngineResult<ContinuityFrame> {
        Ok(ContinuityExtractor::extract_last_frame(self, clip_ref).await?)
    }
}
