//! Bounded exponential backoff for search engine reads.

use std::future::Future;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::SearchResult;

use super::config::RetryConfig;

/// Runs `call` until it succeeds, fails with a non-transient error, or the
/// attempts in `retry` are used up. The last error is returned.
///
/// Only idempotent reads go through here; writes are never retried.
pub async fn retry_search<T, F, Fut>(
    retry: &RetryConfig,
    operation: &'static str,
    mut call: F,
) -> SearchResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SearchResult<T>>,
{
    let max_attempts = retry.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation, attempts = attempt, "Search succeeded after retries");
                }
                return Ok(value);
            }
            Err(e) if attempt < max_attempts && e.is_transient() => {
                let delay = retry.delay_before(attempt + 1);
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    error = %e,
                    "Search attempt failed, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    transient = e.is_transient(),
                    error = %e,
                    "Search attempt failed, giving up"
                );
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn unavailable() -> SearchError {
        SearchError::Status {
            status: 503,
            message: "unavailable".to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors_with_backoff() {
        let calls = AtomicU32::new(0);
        let started = Instant::now();

        let result: SearchResult<()> = retry_search(&RetryConfig::default(), "search", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 500ms before the second attempt, 1s before the third, nothing after.
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_success() {
        let calls = AtomicU32::new(0);
        let result = retry_search(&RetryConfig::default(), "search", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move { if n == 0 { Err(SearchError::Timeout) } else { Ok(n) } }
        })
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: SearchResult<()> = retry_search(&RetryConfig::default(), "search", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(SearchError::Status {
                    status: 400,
                    message: "bad filter_by".to_string(),
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let retry = RetryConfig::default().with_max_attempts(0);
        let _: SearchResult<()> = retry_search(&retry, "search", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(SearchError::Timeout) }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
