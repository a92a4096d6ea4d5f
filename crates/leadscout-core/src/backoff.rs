//! Exponential backoff for transient source failures.

use std::time::Duration;

/// Retry policy: wait `base_delay * 2^retry` before each retry, at most
/// `max_retries` times after the initial attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Retries after the initial attempt
    pub max_retries: u32,
}

impl BackoffPolicy {
    /// Create a policy.
    #[must_use]
    pub fn new(base_delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            max_retries,
        }
    }

    /// Delay before retry number `retry` (zero-based). Saturates instead of
    /// overflowing for absurd retry counts.
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 5)
    }
}
