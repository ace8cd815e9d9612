//! Bounded retry for timeout-class failures

use comet_common::{CometError, Result};
use std::{future::Future, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::warn;

/// Attempts made by [`execute_with_retry`] unless configured otherwise
pub const DEFAULT_RETRY_ATTEMPTS: usize = 5;

/// Run `operation` up to `attempts` times, retrying only timeout-class failures.
///
/// Rate-limit and every other non-timeout failure is returned immediately.
/// When every attempt times out the result is
/// [`CometError::RetryLimitExceeded`] carrying the last failure.
pub async fn execute_with_retry<T, F, Fut>(attempts: usize, operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    // 100ms, 200ms, 400ms, ...
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(50)
        .max_delay(Duration::from_secs(5))
        .take(attempts - 1);

    RetryIf::spawn(strategy, operation, |err: &CometError| {
        let retry = err.is_timeout() && !err.is_rate_limit();
        if retry {
            warn!(error = %err, "Timeout, retrying");
        }
        retry
    })
    .await
    .map_err(|err| {
        if err.is_timeout() {
            warn!(attempts, "Retry budget exhausted");
            CometError::RetryLimitExceeded {
                attempts,
                last: Some(Box::new(err)),
            }
        } else {
            err
        }
    })
}
