//! Exponential backoff for idempotent requests

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::Result;

/// Base delay used by the HTTP providers
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Delay before retry number `attempt` (0-based): `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Run `operation`, retrying up to `retries` extra times on error
///
/// Only use this for requests that are safe to repeat.
pub async fn retry_with_backoff<F, Fut, T>(
    label: &str,
    retries: u32,
    base: Duration,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < retries => {
                let delay = backoff_delay(base, attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}): {}; retrying in {:?}",
                    label,
                    attempt + 1,
                    retries + 1,
                    e,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
