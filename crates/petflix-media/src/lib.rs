//! Local media handling: clip download, FFprobe duration measurement,
//! and last-frame extraction for scene-to-scene continuity.

pub mod download;
pub mod error;
pub mod frame;
pub mod images;
pub mod probe;

pub use download::download_clip;
pub use error::{MediaError, MediaResult};
pub use frame::{ContinuityExtractor, ContinuityFrame, LAST_FRAME_BACKOFF_SECS};
pub use images::{inline_image_ref, ReferenceImageLibrary};
pub use probe::measure_duration;
