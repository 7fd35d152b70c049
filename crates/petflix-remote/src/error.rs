//! Remote client error types.

use thiserror::Error;

pub type RemoteResult<T> = Result<T, RemoteError>;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("API credentials missing: {0}")]
    MissingCredentials(String),

    #[error("API request failed (status {status}): {message}")]
    RequestFailed { status: u16, message: String },

    #[error("Generation task failed: {0}")]
    GenerationFailed(String),

    #[error("Polling timed out after {0} seconds")]
    Timeout(u64),

    #[error("Render submission rejected: {0}")]
    RenderSubmitFailed(String),

    #[error("Render job failed: {0}")]
    RenderFailed(String),

    #[error("Render polling gave up: {0}")]
    RenderPollFailed(String),

    #[error("Invalid timeline: {0}")]
    InvalidTimeline(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RemoteError {
    /// Server-side and transport failures are worth another attempt;
    /// client errors and terminal task states are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::Network(_) => true,
            RemoteError::RequestFailed { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_retryable_client_errors_not() {
        assert!(RemoteError::RequestFailed {
            status: 503,
            message: "unavailable".into()
        }
        .is_retryable());
        assert!(!RemoteError::RequestFailed {
            status: 401,
            message: "unauthorized".into()
        }
        .is_retryable());
        assert!(!RemoteError::GenerationFailed("policy".into()).is_retryable());
        assert!(!RemoteError::Timeout(300).is_retryable());
    }
}
