//! Bounded retry with linear backoff.
//!
//! The schedule is fixed: a failed attempt `i` (1-indexed) waits
//! `1000 * i` milliseconds before the next attempt, with no wait after the
//! final failure. Callers size their own timeout budgets around this exact
//! schedule, so it must stay linear rather than exponential.

use std::future::Future;
use std::time::Duration;

/// Delay unit between attempts, scaled by the attempt number.
const BACKOFF_UNIT_MS: u64 = 1000;

/// Run `op` up to `max_attempts` times, sleeping `1000 * attempt` ms after
/// each failure. Returns the first success, or the last error once the
/// budget is exhausted.
pub async fn retry<T, E, F, Fut>(mut op: F, max_attempts: u32) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt >= max_attempts => {
                tracing::warn!(attempt, error = %err, "operation failed, retries exhausted");
                return Err(err);
            }
            Err(err) => {
                let delay = Duration::from_millis(BACKOFF_UNIT_MS * u64::from(attempt));
                tracing::debug!(
                    attempt,
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
