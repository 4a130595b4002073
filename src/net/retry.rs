use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retry schedule applied by the HTTP transport to a single request.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// One attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// `retries` extra attempts with a short exponential schedule.
    pub fn with_retries(retries: u32) -> Self {
        Self::new(retries.saturating_add(1), Duration::from_millis(100), Duration::from_secs(2))
    }

    pub fn exponential_backoff(&self, attempt: u32) -> Duration {
        let delay = (self.base_delay.as_millis() as u64).saturating_mul(2_u64.saturating_pow(attempt));
        Duration::from_millis(delay.min(self.max_delay.as_millis() as u64))
    }

    /// Add jitter to prevent thundering herd
    pub fn exponential_backoff_with_jitter(&self, attempt: u32) -> Duration {
        let base_delay = self.exponential_backoff(attempt);
        let jitter_ms = rand::random::<u64>() % (base_delay.as_millis() as u64 / 4 + 1);
        Duration::from_millis(base_delay.as_millis() as u64 + jitter_ms)
    }

    /// Runs `op` until it succeeds or the attempts are exhausted, returning the
    /// last error.
    pub async fn retry_with_jitter<F, T, E, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(e) if attempt + 1 < self.max_attempts => {
                    let delay = self.exponential_backoff_with_jitter(attempt);
                    debug!("Attempt {} failed ({}), retrying in {:?}", attempt + 1, e, delay);
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), Duration::from_millis(500));

        assert_eq!(policy.exponential_backoff(0), Duration::from_millis(100));
        assert_eq!(policy.exponential_backoff(2), Duration::from_millis(400));
        assert_eq!(policy.exponential_backoff(3), Duration::from_millis(500));
        assert_eq!(policy.exponential_backoff(40), Duration::from_millis(500));
    }

    #[test]
    fn zero_attempts_still_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts, 1);
    }

    #[test]
    fn retry_count_saturates_instead_of_overflowing() {
        assert_eq!(RetryPolicy::with_retries(u32::MAX).max_attempts, u32::MAX);
        assert_eq!(RetryPolicy::with_retries(2).max_attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::with_retries(3);

        let result: Result<u32, String> = policy
            .retry_with_jitter(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(format!("attempt {n}"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn single_attempt_returns_first_error() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), String> = RetryPolicy::none()
            .retry_with_jitter(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            })
            .await;

        assert_eq!(result, Err("down".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
