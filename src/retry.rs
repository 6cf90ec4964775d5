use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Bounded retry with exponential backoff, shared by the feed client and the
/// webhook delivery client. `max_retries` counts retries after the first
/// attempt, so a policy with `max_retries = 3` makes at most 4 calls with
/// delays of `initial_backoff`, 2x, 4x between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_secs(5),
        }
    }
}

/// Terminal failure: how many calls were made, and the last underlying cause.
#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub last: E,
}

impl RetryPolicy {
    /// Total number of calls this policy allows.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay inserted before retry number `retry` (zero-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(retry))
    }

    /// Run `op` until it succeeds, the error is not retryable, or attempts
    /// run out. Sleeps between attempts; never between the last failure and
    /// the returned error.
    pub async fn run<T, E, P, F, Fut>(
        &self,
        what: &str,
        retryable: P,
        mut op: F,
    ) -> Result<T, RetryError<E>>
    where
        P: Fn(&E) -> bool,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = self.attempts();
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt >= max_attempts || !retryable(&e) {
                        return Err(RetryError { attempts: attempt, last: e });
                    }
                    let delay = self.backoff_for(attempt - 1);
                    tracing::warn!(
                        what,
                        attempt,
                        max_attempts,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "attempt failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
