//! Backoff for transient registry feed failures.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Network failures, 429 and 5xx are worth another attempt. Everything else
/// (404, other 4xx, bad JSON) will fail the same way again.
fn is_transient(err: &ScraperError) -> bool {
    match err {
        ScraperError::RateLimited { .. } | ScraperError::Http(_) => true,
        ScraperError::UnexpectedStatus { status, .. } => (500..600).contains(status),
        _ => false,
    }
}

/// Seconds to wait before retry number `attempt + 1`: `base * 2^attempt`,
/// raised to the server's `Retry-After` when a 429 asks for longer.
fn delay_before_retry(err: &ScraperError, attempt: u32, backoff_base_secs: u64) -> u64 {
    let backoff = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
    match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } if backoff_base_secs > 0 => backoff.max(*retry_after_secs),
        _ => backoff,
    }
}

/// Runs `operation`, retrying transient failures up to `max_retries` extra
/// times. The last error is returned once retries run out.
///
/// A zero `backoff_base_secs` disables waiting entirely, including any
/// `Retry-After` hint.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if attempt >= max_retries || !is_transient(&err) {
            return Err(err);
        }

        let delay_secs = delay_before_retry(&err, attempt, backoff_base_secs);
        tracing::warn!(
            attempt = attempt + 1,
            max_retries,
            delay_secs,
            error = %err,
            "registry feed failed; retrying"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn rate_limited(retry_after_secs: u64) -> ScraperError {
        ScraperError::RateLimited {
            url: "https://registry.example/empresas".to_owned(),
            retry_after_secs,
        }
    }

    fn server_error() -> ScraperError {
        ScraperError::UnexpectedStatus {
            status: 503,
            url: "https://registry.example/empresas".to_owned(),
        }
    }

    #[test]
    fn only_transient_errors_are_retried() {
        assert!(is_transient(&rate_limited(1)));
        assert!(is_transient(&server_error()));
        assert!(!is_transient(&ScraperError::NotFound {
            url: "https://registry.example".to_owned()
        }));
        assert!(!is_transient(&ScraperError::UnexpectedStatus {
            status: 403,
            url: "https://registry.example".to_owned()
        }));
    }

    #[test]
    fn delay_doubles_and_respects_retry_after() {
        assert_eq!(delay_before_retry(&server_error(), 0, 5), 5);
        assert_eq!(delay_before_retry(&server_error(), 2, 5), 20);
        assert_eq!(delay_before_retry(&rate_limited(60), 0, 5), 60);
        assert_eq!(delay_before_retry(&rate_limited(1), 1, 5), 10);
        assert_eq!(delay_before_retry(&rate_limited(60), 0, 0), 0);
    }

    #[tokio::test]
    async fn first_success_is_returned_without_retry() {
        let calls = Cell::new(0u32);
        let result = retry_with_backoff(3, 0, || {
            calls.set(calls.get() + 1);
            async { Ok::<_, ScraperError>("ok") }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_between_attempts_until_success() {
        let calls = Cell::new(0u32);
        let started = tokio::time::Instant::now();
        let result = retry_with_backoff(3, 2, || {
            let n = calls.get();
            calls.set(n + 1);
            async move {
                if n < 2 {
                    Err(server_error())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        // 2s after the first failure, 4s after the second.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(7), "{elapsed:?}");
    }

    #[tokio::test]
    async fn returns_last_error_when_retries_run_out() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry_with_backoff(2, 0, || {
            calls.set(calls.get() + 1);
            async { Err(server_error()) }
        })
        .await;

        assert!(matches!(result, Err(ScraperError::UnexpectedStatus { status: 503, .. })));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn not_found_fails_on_first_attempt() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry_with_backoff(3, 0, || {
            calls.set(calls.get() + 1);
            async {
                Err(ScraperError::NotFound {
                    url: "https://registry.example/missing".to_owned(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(ScraperError::NotFound { .. })));
        assert_eq!(calls.get(), 1);
    }
}
