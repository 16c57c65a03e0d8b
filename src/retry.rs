// src/retry.rs - Bounded retry primitive
use tokio::time::{Instant, sleep};

use crate::config::RetryPolicy;

/// Repeatedly invoke `test` at a fixed interval until it reports success or
/// the wall-clock budget runs out.
///
/// The deadline is fixed on entry and checked before every attempt, so a
/// zero timeout never invokes `test` at all, and a test that succeeds
/// immediately returns without sleeping. An `Err` from `test` propagates
/// right away; this loop only retries "not yet", never failures.
pub async fn retry_until<E, F>(policy: RetryPolicy, mut test: F) -> Result<bool, E>
where
    F: AsyncFnMut() -> Result<bool, E>,
{
    let deadline = Instant::now() + policy.timeout;
    let mut attempt: u32 = 0;
    loop {
        if Instant::now() >= deadline {
            return Ok(false);
        }
        if test().await? {
            return Ok(true);
        }
        attempt += 1;
        tracing::debug!(attempt, "condition not met, retrying");
        sleep(policy.interval).await;
    }
}
