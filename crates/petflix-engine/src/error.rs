//! Pipeline error taxonomy.
//!
//! Every failure mode maps to exactly one variant, and every variant
//! carries a stable user-facing message via [`EngineError::user_message`].
//! Lower-layer errors are folded in through `From` impls so the
//! orchestrator can use `?` throughout.

use petflix_media::MediaError;
use petflix_models::ThemeError;
use petflix_remote::RemoteError;
use petflix_store::StoreError;
use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid theme: {0}")]
    InvalidTheme(String),

    #[error("Generation API unreachable")]
    NetworkUnavailable,

    #[error("Service misconfigured: {0}")]
    ApiConfigError(String),

    #[error("Budget cap would be exceeded")]
    BudgetExceeded,

    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    #[error("API timed out after {0} seconds")]
    ApiTimeout(u64),

    #[error("Video generation failed: {0}")]
    VideoGenerationFailed(String),

    #[error("Image handling failed: {0}")]
    ImageLoadError(String),

    #[error("Render submission failed: {0}")]
    RenderSubmitFailed(String),

    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Render polling gave up: {0}")]
    RenderPollFailed(String),

    #[error("Run was cancelled")]
    Cancelled,

    #[error("{0}")]
    Generic(String),
}

impl EngineError {
    /// Stable, user-presentable message for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            EngineError::InvalidTheme(_) => {
                "The selected theme is invalid. Please go back and choose a different theme."
            }
            EngineError::NetworkUnavailable => {
                "No internet connection detected. Please connect to the internet and try again."
            }
            EngineError::ApiConfigError(_) => {
                "Video creation service is not configured correctly. Please contact support if \
                 the problem persists."
            }
            EngineError::BudgetExceeded => {
                "Video creation usage limit reached. Please try again later or contact support."
            }
            EngineError::ApiRequestFailed(_) => {
                "Something went wrong while communicating with our servers. Please check your \
                 connection and try again."
            }
            EngineError::ApiTimeout(_) => {
                "The request timed out. Please check your connection and try again."
            }
            EngineError::VideoGenerationFailed(_)
            | EngineError::RenderSubmitFailed(_)
            | EngineError::RenderFailed(_)
            | EngineError::RenderPollFailed(_) => {
                "We couldn't create your video this time. Please try again later."
            }
            EngineError::ImageLoadError(_) => {
                "Could not load the selected image. Please try a different one."
            }
            EngineError::Cancelled => "Video creation was cancelled.",
            EngineError::Generic(_) => {
                "An unexpected error occurred. Please try again or restart the app."
            }
        }
    }
}

impl From<RemoteError> for EngineError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::MissingCredentials(what) => EngineError::ApiConfigError(what),
            RemoteError::RequestFailed { .. } => EngineError::ApiRequestFailed(e.to_string()),
            RemoteError::GenerationFailed(code) => EngineError::VideoGenerationFailed(code),
            RemoteError::Timeout(secs) => EngineError::ApiTimeout(secs),
            RemoteError::RenderSubmitFailed(msg) => EngineError::RenderSubmitFailed(msg),
            RemoteError::RenderFailed(msg) => EngineError::RenderFailed(msg),
            RemoteError::RenderPollFailed(msg) => EngineError::RenderPollFailed(msg),
            RemoteError::InvalidTimeline(msg) => EngineError::Generic(msg),
            RemoteError::InvalidResponse(msg) => EngineError::Generic(msg),
            RemoteError::Network(_) => EngineError::NetworkUnavailable,
            RemoteError::Json(e) => EngineError::Generic(e.to_string()),
        }
    }
}

impl From<MediaError> for EngineError {
    fn from(e: MediaError) -> Self {
        EngineError::ImageLoadError(e.to_string())
    }
}

impl From<ThemeError> for EngineError {
    fn from(e: ThemeError) -> Self {
        match e {
            ThemeError::InvalidTheme(id) => EngineError::InvalidTheme(id),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        EngineError::Generic(e.to_string())
    }
}
