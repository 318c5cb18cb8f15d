//! Opt-in retry of transport failures with exponential backoff
//!
//! Only [`ApiError::Transport`] is ever retried: a response from the server,
//! successful or not, is taken as final. The default policy performs a single
//! attempt, so enabling retries is always an explicit configuration choice.

use crate::error::{ApiError, Result};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    /// Backoff before the second attempt
    pub initial_backoff: Duration,

    /// Upper bound for any single backoff
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::no_retry()
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// A single attempt; transport failures surface immediately
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Three attempts, 500ms then 1s apart
    pub fn bounded() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        Duration::from_millis(backoff_ms as u64).min(self.max_backoff)
    }

    fn is_retryable(error: &ApiError) -> bool {
        error.is_transport()
    }

    /// Run `operation` until it succeeds, fails with a non-transport error,
    /// or the attempts are used up. The last error is returned.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!("{operation_name} succeeded after {attempt} retries");
                    }
                    return Ok(value);
                }
                Err(err) if Self::is_retryable(&err) && attempt + 1 < attempts => {
                    attempt += 1;
                    let backoff = self.backoff_duration(attempt);
                    warn!(
                        "{operation_name} failed (attempt {attempt}/{attempts}): {err}. Retrying in {backoff:?}"
                    );
                    sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(100), 2.0)
    }

    #[test]
    fn test_default_is_single_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy, RetryPolicy::no_retry());
        assert_eq!(policy.max_attempts, 1);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::bounded();
        assert_eq!(policy.backoff_duration(0), Duration::ZERO);
        assert_eq!(policy.backoff_duration(1), Duration::from_millis(500));
        assert_eq!(policy.backoff_duration(2), Duration::from_secs(1));
        assert_eq!(policy.backoff_duration(10), Duration::from_secs(5));
    }

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(RetryPolicy::is_retryable(&ApiError::Transport("reset".into())));
        assert!(!RetryPolicy::is_retryable(&ApiError::Decode("bad".into())));
        assert!(!RetryPolicy::is_retryable(&ApiError::Status {
            status: 503,
            reason: "Service Unavailable".into(),
            body: None,
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_success_after_retry() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let result = fast()
            .execute("status", || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(ApiError::Transport("reset".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_gives_up_after_max_attempts() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let result: Result<()> = fast()
            .execute("status", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Transport("down".into()))
                }
            })
            .await;

        assert!(result.unwrap_err().is_transport());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let result: Result<()> = fast()
            .execute("status", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Status {
                        status: 500,
                        reason: "Internal Server Error".into(),
                        body: None,
                    })
                }
            })
            .await;

        assert_eq!(result.unwrap_err().status(), Some(500));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_surfaces_first_failure() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);

        let result: Result<()> = RetryPolicy::no_retry()
            .execute("status", || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::Transport("down".into()))
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
