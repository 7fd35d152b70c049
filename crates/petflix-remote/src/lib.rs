//! HTTP clients for the two external services the pipeline depends on:
//! the generative-video API (task create + poll) and the render/stitch
//! API (timeline submit + poll). Both share one retry policy.

pub mod error;
pub mod generation;
pub mod render;
pub mod retry;
pub mod types;

pub use error::{RemoteError, RemoteResult};
pub use generation::{GenerationClient, GenerationConfig};
pub use render::{build_timeline, RenderClient, RenderConfig};
pub use retry::RetryPolicy;
