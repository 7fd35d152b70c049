//! Shared retry policy for remote submissions.
//!
//! One policy covers both API clients: a bounded number of attempts with
//! exponential backoff, retrying only errors the
//! [`RemoteError::is_retryable`] predicate accepts. Polling loops have
//! their own in-window transient handling and do not go through this.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{RemoteError, RemoteResult};

/// Bounded exponential backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles each attempt
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// No retries at all; single attempt.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `operation`, retrying retryable failures with backoff.
    pub async fn run<F, Fut, T>(&self, operation: F) -> RemoteResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = RemoteResult<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.base_delay * 2u32.pow(attempt);
                    warn!(
                        "Remote request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(RemoteError::InvalidResponse(
            "retry loop exhausted without an error".to_string(),
        )))
    }
}
