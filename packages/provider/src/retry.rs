//! Rate-limit backoff for the sector endpoint.
//!
//! The sector endpoint is the only upstream call that gets retried: a
//! 429 is waited out with a linear schedule (`attempt × base delay`) up
//! to a fixed bound, after which [`ProviderError::RateLimited`] carries
//! the spent retry count so the caller can switch to the article-list
//! fallback. Other failures pass through untouched — retry policy for
//! them belongs to the caller.

use std::future::Future;
use std::time::Duration;

use crate::ProviderError;

/// Maximum number of backoff retries for a rate-limited sector fetch.
pub const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Base delay for the linear backoff schedule. The n-th retry waits
/// `n × base`.
pub const RATE_LIMIT_BASE_DELAY: Duration = Duration::from_millis(500);

/// Runs `operation`, retrying rate-limited failures with linear backoff.
///
/// The operation is attempted at most `max_retries + 1` times. Success
/// and non-rate-limit errors return immediately.
///
/// # Errors
///
/// Returns [`ProviderError::RateLimited`] with `retries = max_retries`
/// when every attempt was rate limited, or the operation's own error
/// for any non-429 failure.
pub async fn with_rate_limit_backoff<T, F, Fut>(
    mut operation: F,
    max_retries: u32,
    base_delay: Duration,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Err(e) if e.is_rate_limited() && attempt < max_retries => {
                attempt += 1;
                let delay = base_delay * attempt;
                log::warn!(
                    "rate limited (retry {attempt}/{max_retries}), waiting {delay:?} before retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) if e.is_rate_limited() => {
                return Err(ProviderError::RateLimited {
                    retries: max_retries,
                });
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited { retries: 0 }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt_after_two_429s() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = with_rate_limit_backoff(
            || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call < 2 {
                        Err(rate_limited())
                    } else {
                        Ok(call)
                    }
                }
            },
            MAX_RATE_LIMIT_RETRIES,
            RATE_LIMIT_BASE_DELAY,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Linear schedule: 1×base + 2×base.
        assert_eq!(started.elapsed(), RATE_LIMIT_BASE_DELAY * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_retries_into_rate_limited_error() {
        let calls = AtomicU32::new(0);

        let result: Result<(), ProviderError> = with_rate_limit_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(rate_limited()) }
            },
            2,
            Duration::from_millis(10),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial try plus two retries");
        match result {
            Err(ProviderError::RateLimited { retries }) => assert_eq!(retries, 2),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_rate_limit_errors_pass_through() {
        let calls = AtomicU32::new(0);

        let result: Result<(), ProviderError> = with_rate_limit_backoff(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    Err(ProviderError::Status { status: 500 })
                }
            },
            MAX_RATE_LIMIT_RETRIES,
            RATE_LIMIT_BASE_DELAY,
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1, "no retry on non-429");
        assert!(matches!(result, Err(ProviderError::Status { status: 500 })));
    }
}
