//! Shared data models for the PetFlix backend.
//!
//! This crate provides Serde-serializable types for:
//! - Narrative themes and scene prompts
//! - Generated clips with tagged duration precision
//! - Generation task and render job state machines
//! - Progress stages and the weighted progress aggregator

pub mod clip;
pub mod progress;
pub mod render;
pub mod task;
pub mod theme;

// Re-export common types
pub use clip::{ClipDuration, ClipResult};
pub use progress::{ProgressAggregator, ProgressState, Stage};
pub use render::{RenderJob, RenderStatus, Resolution};
pub use task::{GenerationTask, TaskState};
pub use theme::{vary_prompt, SceneSpec, Theme, ThemeCatalog, ThemeError, SCENES_PER_THEME};
