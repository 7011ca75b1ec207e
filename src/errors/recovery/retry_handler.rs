// Jittered exponential backoff for operations that are safe to retry.
use crate::errors::{CoreError, RetryConfiguration};
use tokio::time::sleep;
use tracing::{info, warn};

#[derive(Clone)]
pub struct RetryHandler {
    config: RetryConfiguration,
}

impl RetryHandler {
    pub fn new(config: RetryConfiguration) -> Self {
        Self { config }
    }

    /// Retry `operation` until it succeeds, a non-recoverable error is returned, or
    /// `max_attempts` is exhausted. Used exclusively for the TCP connect step.
    pub async fn retry_with_backoff<F, Fut, T>(&self, mut operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        info!(attempt, "connect succeeded after retrying");
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_recoverable() || attempt >= self.config.max_attempts {
                        return Err(error);
                    }

                    let delay = self.config.delay_for_attempt(attempt);
                    warn!(attempt, max_attempts = self.config.max_attempts, ?delay, %error, "connect failed, retrying");
                    sleep(delay).await;
                }
            }
        }
    }
}
