//! Async retry utilities with exponential backoff

use std::time::Duration;

/// Default maximum retry attempts for database operations
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds for exponential backoff
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Retry an async operation with exponential backoff while `is_retryable`
/// accepts the error.
///
/// Returns the first success, the first non-retryable error, or the last
/// error once `max_attempts` is exhausted.
pub async fn retry_with_backoff_async<T, E, F, Fut, R>(
    max_attempts: u32,
    base_delay_ms: u64,
    is_retryable: R,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    R: Fn(&E) -> bool,
{
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= max_attempts || !is_retryable(&e) {
                    return Err(e);
                }
                let delay = Duration::from_millis(base_delay_ms * 2_u64.pow(attempts - 1));
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
