use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::RetryConfig;

/// Bounded exponential backoff around platform calls.
///
/// With `max_retries == 0` an operation runs exactly once and its error is
/// returned as is.
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_retries, config.initial_backoff_ms, config.max_backoff_ms)
    }

    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// Run `f` until it succeeds or the retry budget is spent.
    pub async fn retry<F, Fut, T>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            let err = match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(operation, attempts = attempt + 1, "Recovered after retrying");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if attempt >= self.max_retries {
                if attempt == 0 {
                    return Err(err);
                }
                warn!(operation, attempts = attempt + 1, error = %err, "Giving up");
                return Err(err.context(format!("{} failed after {} attempts", operation, attempt + 1)));
            }

            attempt += 1;
            warn!(
                operation,
                attempt,
                max_retries = self.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Retrying"
            );

            sleep(backoff).await;
            backoff = (backoff * 2).min(self.max_backoff);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_no_retries_runs_once() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::none();

        let err = policy
            .retry("mentions_timeline", || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(anyhow::anyhow!("boom")) }
            })
            .await
            .unwrap_err();

        // Error surfaces untouched when retries are off
        assert_eq!(format!("{:#}", err), "boom");
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_recovers_within_budget() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(3, 1, 2);

        let value = policy
            .retry("user_timeline", || {
                calls.set(calls.get() + 1);
                let n = calls.get();
                async move {
                    if n < 3 {
                        anyhow::bail!("fail {}", n);
                    }
                    Ok(n)
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::new(2, 1, 1);

        let err = policy
            .retry("update_status", || {
                calls.set(calls.get() + 1);
                async { Err::<(), _>(anyhow::anyhow!("still down")) }
            })
            .await
            .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("update_status failed after 3 attempts"));
        assert!(message.contains("still down"));
        assert_eq!(calls.get(), 3);
    }
}
