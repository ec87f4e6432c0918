use std::time::Duration;

/// Bounded linear-backoff retry policy.
///
/// Policies are pure data: they describe how long to wait before a given
/// retry attempt but do not execute anything themselves, which keeps them
/// trivial to inspect and test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts, not counting the initial attempt.
    pub max_retries: u32,
    /// Backoff grows linearly: the n-th retry waits `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_step: Duration) -> Self {
        Self {
            max_retries,
            backoff_step,
        }
    }

    /// Delay before the `attempt`-th retry (1-based).
    ///
    /// Returns `None` once `attempt` exceeds `max_retries`, i.e. when the
    /// chain should give up instead of waiting.
    pub fn delay_for_attempt(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries {
            return None;
        }
        Some(self.backoff_step * attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_delays() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_for_attempt(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_for_attempt(3), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_exhausted_after_max_retries() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(4), None);
    }

    #[test]
    fn test_attempt_zero_is_not_a_retry() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), None);
    }

    #[test]
    fn test_delays_strictly_increase() {
        let policy = RetryPolicy::new(5, Duration::from_millis(250));
        let delays: Vec<_> = (1..=5)
            .map(|n| policy.delay_for_attempt(n).unwrap())
            .collect();
        assert!(delays.windows(2).all(|w| w[0] < w[1]));
    }
}
