//! Bounded retry with a fixed delay
//!
//! Every object operation runs inside [`retry_with_delay`]. Without a
//! configured maximum the operation is attempted exactly once.

use std::future::Future;
use std::time::Duration;

use crate::error::{Error, Result};

/// How many times an operation is attempted and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Maximum number of attempts; `None` disables retries
    pub max_retry: Option<u32>,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retry: Option<u32>, delay: Duration) -> Self {
        Self { max_retry, delay }
    }

    /// A policy that never retries
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Total number of attempts, never less than one
    pub fn attempts(&self) -> u32 {
        self.max_retry.map_or(1, |n| n.max(1))
    }
}

/// Retry a fallible async operation with a fixed delay between attempts
///
/// The error of the last attempt is always returned to the caller. Errors
/// rejected by `is_retryable` are returned immediately.
///
/// # Example
/// ```ignore
/// let data = retry_with_delay(
///     &policy,
///     || async { client.get(&key).await },
///     is_retryable_error,
/// ).await?;
/// ```
pub async fn retry_with_delay<T, F, Fut, R>(
    policy: &RetryPolicy,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: Fn(&Error) -> bool,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                if attempt >= attempts || !is_retryable(&e) {
                    return Err(e);
                }

                tracing::debug!(
                    attempt = attempt,
                    remaining = attempts - attempt,
                    delay_ms = policy.delay.as_millis(),
                    error = %e,
                    "Retrying after transient error"
                );

                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}

/// Check if an error is transient
///
/// HTTP-level failures (API and auth responses) and transport errors are
/// retried; local and configuration errors are not.
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Api { .. } | Error::Auth { .. } | Error::Network(_) => true,
        Error::Config(_)
        | Error::InvalidPath(_)
        | Error::MalformedResponse { .. }
        | Error::Io(_)
        | Error::General(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Operation;
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> Error {
        Error::Api {
            operation: Operation::Get,
            url: "https://example.com/c/p".to_string(),
            status: 500,
            message: "Internal Server Error".to_string(),
            headers: BTreeMap::new(),
        }
    }

    #[test]
    fn test_attempts() {
        assert_eq!(RetryPolicy::disabled().attempts(), 1);
        assert_eq!(RetryPolicy::new(Some(0), Duration::ZERO).attempts(), 1);
        assert_eq!(RetryPolicy::new(Some(1), Duration::ZERO).attempts(), 1);
        assert_eq!(RetryPolicy::new(Some(3), Duration::ZERO).attempts(), 3);
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable_error(&server_error()));
        assert!(is_retryable_error(&Error::Network("connection reset".into())));
        assert!(is_retryable_error(&Error::Auth {
            status: 500,
            message: "unexpected status".into()
        }));

        assert!(!is_retryable_error(&Error::Config("missing user".into())));
        assert!(!is_retryable_error(&Error::InvalidPath("".into())));
        assert!(!is_retryable_error(&Error::MalformedResponse {
            url: "https://example.com".into(),
            message: "missing Content-Length".into()
        }));
    }

    #[tokio::test]
    async fn test_retry_success_first_attempt() {
        let policy = RetryPolicy::new(Some(3), Duration::ZERO);
        let mut calls = 0;

        let result = retry_with_delay(
            &policy,
            || {
                calls += 1;
                async { Ok::<_, Error>(42) }
            },
            is_retryable_error,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_disabled_policy_runs_once() {
        let mut calls = 0;

        let result: Result<()> = retry_with_delay(
            &RetryPolicy::disabled(),
            || {
                calls += 1;
                async { Err(server_error()) }
            },
            is_retryable_error,
        )
        .await;

        assert!(matches!(result, Err(Error::Api { status: 500, .. })));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_retry_success_after_failure() {
        let policy = RetryPolicy::new(Some(3), Duration::ZERO);
        let call_count = Arc::new(AtomicU32::new(0));
        let call_count_clone = call_count.clone();

        let result = retry_with_delay(
            &policy,
            || {
                let cc = call_count_clone.clone();
                async move {
                    let count = cc.fetch_add(1, Ordering::SeqCst);
                    if count < 2 {
                        Err(Error::Network("timeout".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            is_retryable_error,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(call_count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted_propagates_last_error() {
        let policy = RetryPolicy::new(Some(3), Duration::ZERO);
        let mut calls = 0u16;

        // Five failures are queued, only three attempts are made
        let result: Result<()> = retry_with_delay(
            &policy,
            || {
                calls += 1;
                let status = 500 + calls;
                async move {
                    Err(Error::Api {
                        operation: Operation::Put,
                        url: "https://example.com/c/p".to_string(),
                        status,
                        message: "failure".to_string(),
                        headers: BTreeMap::new(),
                    })
                }
            },
            is_retryable_error,
        )
        .await;

        assert_eq!(calls, 3);
        assert_eq!(result.unwrap_err().status(), Some(503));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_attempts() {
        let policy = RetryPolicy::new(Some(3), Duration::from_secs(1));
        let start = tokio::time::Instant::now();

        let result: Result<()> =
            retry_with_delay(&policy, || async { Err(server_error()) }, is_retryable_error).await;

        assert!(result.is_err());
        // Two pauses separate three attempts
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2));
        assert!(elapsed < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_retry_non_retryable() {
        let policy = RetryPolicy::new(Some(3), Duration::ZERO);
        let mut calls = 0;

        let result: Result<()> = retry_with_delay(
            &policy,
            || {
                calls += 1;
                async { Err(Error::Config("missing user or password".to_string())) }
            },
            is_retryable_error,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }
}
