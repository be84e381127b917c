//! Reconnect policy
//!
//! Pure backoff arithmetic, kept separate from the state machine so it can
//! be tested without a socket. Delays double per attempt up to a cap, and
//! retries stop once the attempt budget is spent.

use std::time::Duration;

/// Exponential backoff policy for reconnection attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Number of failed attempts after which the connection is closed for good
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30000),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry following the given failed attempt count:
    /// `min(base * 2^attempt, cap)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Whether another automatic retry is allowed after `attempt` failures
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_up_to_cap() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay(0), Duration::from_millis(1000));
        assert_eq!(policy.delay(1), Duration::from_millis(2000));
        assert_eq!(policy.delay(2), Duration::from_millis(4000));
        assert_eq!(policy.delay(3), Duration::from_millis(8000));
        assert_eq!(policy.delay(4), Duration::from_millis(16000));
        assert_eq!(policy.delay(5), Duration::from_millis(30000));
        assert_eq!(policy.delay(6), Duration::from_millis(30000));
    }

    #[test]
    fn test_delay_is_monotonic() {
        let policy = RetryPolicy::default();

        for attempt in 0..policy.max_attempts {
            assert!(policy.delay(attempt + 1) >= policy.delay(attempt));
        }
    }

    #[test]
    fn test_delay_survives_huge_attempt_counts() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay(u32::MAX), policy.max_delay);
        assert_eq!(policy.delay(64), policy.max_delay);
    }

    #[test]
    fn test_should_retry_boundary() {
        let policy = RetryPolicy::default();

        for attempt in 0..5 {
            assert!(policy.should_retry(attempt));
        }
        assert!(!policy.should_retry(5));
        assert!(!policy.should_retry(6));
    }
}
