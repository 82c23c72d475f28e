//! Capped exponential backoff shared by the reaper's sweep retries and
//! `mpo-storage`'s object-store decorator.

use std::time::Duration;

/// Backoff schedule: `base * 2^attempt`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    max_attempts: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max,
            max_attempts,
        }
    }

    /// Delay before the given attempt (0-indexed). Saturates instead of
    /// overflowing once `2^attempt` would exceed `max`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.min(31);
        let scaled = self.base.as_millis().saturating_mul(1u128 << shift);
        let capped = scaled.min(self.max.as_millis());
        Duration::from_millis(capped as u64)
    }

    /// Whether `attempt` has exhausted the schedule and should be
    /// treated as a terminal failure.
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}

impl Default for Backoff {
    /// 500ms base, 30s cap, 5 attempts -- matches the reaper's default
    /// retry budget for transient infra failures.
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30), 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_each_attempt() {
        let b = Backoff::new(Duration::from_millis(100), Duration::from_secs(60), 10);
        assert_eq!(b.delay(0), Duration::from_millis(100));
        assert_eq!(b.delay(1), Duration::from_millis(200));
        assert_eq!(b.delay(2), Duration::from_millis(400));
    }

    #[test]
    fn delay_is_capped() {
        let b = Backoff::new(Duration::from_millis(100), Duration::from_secs(1), 10);
        assert_eq!(b.delay(10), Duration::from_secs(1));
    }

    #[test]
    fn exhausted_respects_max_attempts() {
        let b = Backoff::new(Duration::from_millis(1), Duration::from_secs(1), 3);
        assert!(!b.exhausted(2));
        assert!(b.exhausted(3));
        assert!(b.exhausted(4));
    }

    #[test]
    fn default_schedule_is_sane() {
        let b = Backoff::default();
        assert_eq!(b.delay(0), Duration::from_millis(500));
        assert!(b.delay(10) <= Duration::from_secs(30));
    }
}
