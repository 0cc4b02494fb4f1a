use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    /// Pause between attempts.
    pub delay: Duration,
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy's retries are used up. Returns the last error.
pub async fn retry<T, E, F, Fut, R>(mut operation: F, policy: RetryPolicy, is_retryable: R) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let mut attempts = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempts += 1;
                tracing::warn!(attempt = attempts, error = %err, "attempt failed");
                if attempts > policy.max_retries || !is_retryable(&err) {
                    return Err(err);
                }
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}
