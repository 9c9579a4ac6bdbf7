//! Retry logic with exponential backoff for transient transport errors.

use crate::error::Result;
use std::thread;
use std::time::Duration;

/// Configuration for retrying idempotent requests.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay between retries
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_factor: f64,
    /// Maximum delay between retries
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Build a config that makes `retries` extra attempts after the first.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            ..Default::default()
        }
    }

    /// Calculate the delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Create a config that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Execute an operation, retrying it while it fails with a retryable error.
///
/// Non-retryable errors (HTTP statuses, decode failures) are returned
/// immediately.
pub fn with_retry<T, F>(config: &RetryConfig, mut operation: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if !e.is_retryable() || attempt + 1 >= max_attempts => return Err(e),
            Err(e) => {
                let delay = config.delay_for_attempt(attempt);
                log::debug!(
                    "Attempt {}/{} failed: {}. Retrying in {:?}",
                    attempt + 1,
                    max_attempts,
                    e,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::cell::Cell;

    fn fast(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_delay_for_attempt_grows_and_caps() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_delay: Duration::from_secs(5),
        };

        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(config.delay_for_attempt(3), Duration::from_secs(5));
    }

    #[test]
    fn test_with_retries_counts_first_attempt() {
        assert_eq!(RetryConfig::with_retries(3).max_attempts, 4);
        assert_eq!(RetryConfig::with_retries(0).max_attempts, 1);
    }

    #[test]
    fn test_with_retry_success_first_try() {
        let result = with_retry(&RetryConfig::no_retry(), || Ok::<_, Error>(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_with_retry_status_error_not_retried() {
        let attempts = Cell::new(0);
        let result: Result<()> = with_retry(&fast(3), || {
            attempts.set(attempts.get() + 1);
            Err(Error::http(500, "boom"))
        });

        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
    }

    #[test]
    fn test_with_retry_eventual_success() {
        let attempts = Cell::new(0);
        let result = with_retry(&fast(3), || {
            let current = attempts.get();
            attempts.set(current + 1);
            if current < 2 {
                Err(Error::Network("timeout".to_string()))
            } else {
                Ok("done")
            }
        });

        assert_eq!(result.unwrap(), "done");
        assert_eq!(attempts.get(), 3);
    }

    #[test]
    fn test_with_retry_exhausted_returns_last_error() {
        let attempts = Cell::new(0);
        let result: Result<()> = with_retry(&fast(2), || {
            attempts.set(attempts.get() + 1);
            Err(Error::Network(format!("attempt {}", attempts.get())))
        });

        assert_eq!(attempts.get(), 2);
        assert!(result.unwrap_err().to_string().contains("attempt 2"));
    }
}
