//! The generation pipeline.
//!
//! One run turns a pet photo and a theme id into a stitched five-scene
//! video: validate inputs, short-circuit on a cache hit, gate the spend,
//! generate the five clips sequentially with continuity frames threaded
//! between them, stitch, cache, done. Any terminal clip failure aborts
//! the run; only continuity extraction is recovered per clip.

use std::sync::Arc;

use petflix_media::ReferenceImageLibrary;
use petflix_models::{vary_prompt, ClipResult, ProgressState, Stage, ThemeCatalog};
use petflix_store::{fingerprint, BudgetTracker, ContentCache};
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::progress::{CancelHandle, ProgressTracker};
use crate::services::{ClipGenerator, SeedFrameSource, Stitcher};

/// Result of one successful run.
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// URL of the final stitched video
    pub video_ref: String,
    /// Per-scene clips, empty on a cache hit
    pub clips: Vec<ClipResult>,
    pub from_cache: bool,
}

/// Drives one photo + theme through the full pipeline.
pub struct GenerationOrchestrator {
    config: EngineConfig,
    catalog: ThemeCatalog,
    generator: Arc<dyn ClipGenerator>,
    stitcher: Arc<dyn Stitcher>,
    frames: Arc<dyn SeedFrameSource>,
    references: ReferenceImageLibrary,
    cache: ContentCache,
    budget: BudgetTracker,
    tracker: ProgressTracker,
}

impl GenerationOrchestrator {
    pub fn new(
        config: EngineConfig,
        catalog: ThemeCatalog,
        generator: Arc<dyn ClipGenerator>,
        stitcher: Arc<dyn Stitcher>,
        frames: Arc<dyn SeedFrameSource>,
    ) -> Self {
        let cache = ContentCache::new(&config.cache_dir);
        let budget = BudgetTracker::new(
            &config.ledger_path,
            config.budget_cap_usd,
            config.unit_price_usd,
        );
        let tracker = ProgressTracker::new(config.total_clips);
        Self {
            config,
            catalog,
            generator,
            stitcher,
            frames,
            references: ReferenceImageLibrary::default(),
            cache,
            budget,
            tracker,
        }
    }

    /// Attach the library that resolves scene reference image ids.
    /// Without one, scenes naming reference ids run without them.
    pub fn with_reference_library(mut self, references: ReferenceImageLibrary) -> Self {
        self.references = references;
        self
    }

    /// New receiver for progress snapshots.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressState> {
        self.tracker.subscribe()
    }

    /// Handle for cancelling a run in flight.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.tracker.cancel_handle()
    }

    /// Run the pipeline. On failure a terminal `Error` snapshot carrying
    /// the user-facing message is broadcast before the error returns.
    pub async fn run(&self, image_ref: &str, theme_id: &str) -> EngineResult<GenerationOutcome> {
        match self.execute(image_ref, theme_id).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(theme_id, "Pipeline failed: {}", e);
                self.tracker.emit(Stage::Error, None, 0.0, e.user_message());
                Err(e)
            }
        }
    }

    async fn execute(&self, image_ref: &str, theme_id: &str) -> EngineResult<GenerationOutcome> {
        self.tracker.reset();
        self.tracker
            .emit(Stage::Initializing, None, 0.0, "Validating theme");

        let scenes = self.catalog.scenes(theme_id)?.to_vec();
        self.generator.ensure_configured()?;
        self.stitcher.ensure_configured()?;

        self.tracker
            .emit(Stage::Initializing, None, 0.4, "Checking connectivity");
        if !self.generator.is_reachable().await {
            return Err(EngineError::NetworkUnavailable);
        }

        let key = fingerprint(image_ref, theme_id);
        if let Some(entry) = self.cache.get(&key).await? {
            info!(theme_id, "Cache hit, skipping generation");
            self.tracker
                .emit(Stage::Complete, None, 1.0, "Video ready (cached)");
            return Ok(GenerationOutcome {
                video_ref: entry.video_ref,
                clips: Vec::new(),
                from_cache: true,
            });
        }

        // Gate the whole run's spend before the first billable call
        let per_call = self.budget.call_cost(self.config.estimated_clip_seconds);
        let run_estimate = per_call * f64::from(self.config.total_clips);
        if !self.budget.can_spend(run_estimate).await {
            return Err(EngineError::BudgetExceeded);
        }

        // The generation API takes embeddable image data, never a
        // device path or symbolic id
        let source_seed = self.frames.inline_source_image(image_ref).await?;

        self.tracker
            .emit(Stage::Initializing, None, 1.0, "Setup complete");

        let total = self.config.total_clips;
        let mut seed = source_seed.clone();
        let mut clips: Vec<ClipResult> = Vec::with_capacity(scenes.len());

        for (idx, scene) in scenes.iter().enumerate() {
            let clip_number = (idx + 1) as u32;
            self.check_live()?;

            // Pace submissions so the generation API does not throttle us
            if idx > 0 && !self.config.inter_call_delay.is_zero() {
                tokio::time::sleep(self.config.inter_call_delay).await;
            }

            let prompt = vary_prompt(&scene.prompt, clip_number as usize);
            let reference_images = self.references.resolve(&scene.reference_image_ids).await;
            self.tracker.emit(
                Stage::Generating,
                Some(clip_number),
                0.0,
                format!("Generating scene {} of {}", clip_number, total),
            );

            let on_progress = |p: f64| {
                self.tracker.emit(
                    Stage::Generating,
                    Some(clip_number),
                    0.1 + 0.9 * p,
                    format!("Generating scene {} of {}", clip_number, total),
                );
            };
            let mut clip = self
                .generator
                .generate(&prompt, &seed, &reference_images, &on_progress)
                .await?;

            if let Err(e) = self.budget.record_spend(per_call).await {
                warn!("Failed to record spend: {}", e);
            }

            // Thread the last frame into the next scene and upgrade this
            // clip's duration to the measured value. A failed extraction
            // falls back to the original photo rather than aborting.
            match self.frames.extract_last_frame(&clip.video_ref).await {
                Ok(frame) => {
                    clip = clip.with_measured_duration(frame.duration_seconds);
                    if clip_number < total {
                        seed = frame.image_data_ref;
                    }
                }
                Err(e) => {
                    warn!(
                        clip = clip_number,
                        "Continuity frame extraction failed, reusing the original photo: {}", e
                    );
                    seed = source_seed.clone();
                }
            }

            self.tracker.emit(
                Stage::Generating,
                Some(clip_number),
                1.0,
                format!("Scene {} complete", clip_number),
            );
            clips.push(clip);
        }

        if clips.is_empty() {
            return Err(EngineError::VideoGenerationFailed(
                "no clips were produced".to_string(),
            ));
        }

        self.check_live()?;
        self.tracker
            .emit(Stage::Stitching, None, 0.0, "Stitching scenes together");
        let video_ref = self.stitcher.stitch(&clips, self.config.resolution).await?;
        self.tracker
            .emit(Stage::Stitching, None, 1.0, "Stitch complete");

        // A finished video must never be lost to a cache write failure
        self.cache.put(&key, &video_ref).await;

        self.tracker.emit(Stage::Complete, None, 1.0, "Video ready");
        info!(theme_id, video_ref, "Pipeline complete");

        Ok(GenerationOutcome {
            video_ref,
            clips,
            from_cache: false,
        })
    }

    fn check_live(&self) -> EngineResult<()> {
        if self.tracker.is_live() {
            Ok(())
        } else {
            Err(EngineError::Cancelled)
        }
    }
}
