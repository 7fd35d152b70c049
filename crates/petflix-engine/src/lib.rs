//! Generation pipeline orchestration.
//!
//! Wires the theme catalog, the two remote clients, the continuity
//! extractor, the content cache, and the budget tracker into one
//! sequential pipeline with broadcast progress and cooperative
//! cancellation.

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod services;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use orchestrator::{GenerationOrchestrator, GenerationOutcome};
pub use progress::{CancelHandle, ProgressTracker};
pub use services::{ClipGenerator, SeedFrameSource, Stitcher};
