//! Progress fan-out rate limiter: the sink callback handed to pipelines
//! writes at most once per 250ms unless progress has moved by at least
//! one percentage point, per spec §4.8.

use std::time::{Duration, Instant};

const MIN_INTERVAL: Duration = Duration::from_millis(250);
const MIN_DELTA_PCT: u8 = 1;

/// Tracks the last-written percentage and timestamp for a single task's
/// progress stream; one instance per in-flight task.
#[derive(Debug)]
pub struct ProgressLimiter {
    last_percent: u8,
    last_write: Instant,
    wrote_once: bool,
}

impl ProgressLimiter {
    pub fn new() -> Self {
        Self {
            last_percent: 0,
            last_write: Instant::now(),
            wrote_once: false,
        }
    }

    /// Returns `true` if a write for `percent` at `now` should go
    /// through, and records it as the new baseline when it does. The
    /// very first call always passes, so a task's initial heartbeat is
    /// never silently dropped.
    pub fn should_write(&mut self, percent: u8, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_write);
        let delta = percent.abs_diff(self.last_percent);

        let allow = !self.wrote_once || elapsed >= MIN_INTERVAL || delta >= MIN_DELTA_PCT;
        if allow {
            self.last_percent = percent;
            self.last_write = now;
            self.wrote_once = true;
        }
        allow
    }
}

impl Default for ProgressLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_write_always_passes() {
        let mut limiter = ProgressLimiter::new();
        assert!(limiter.should_write(0, Instant::now()));
    }

    #[test]
    fn rapid_same_percent_writes_are_suppressed() {
        let mut limiter = ProgressLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.should_write(10, t0));
        assert!(!limiter.should_write(10, t0 + Duration::from_millis(50)));
    }

    #[test]
    fn write_passes_once_interval_elapses() {
        let mut limiter = ProgressLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.should_write(10, t0));
        assert!(limiter.should_write(10, t0 + Duration::from_millis(260)));
    }

    #[test]
    fn write_passes_on_one_point_delta_even_within_interval() {
        let mut limiter = ProgressLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.should_write(10, t0));
        assert!(limiter.should_write(11, t0 + Duration::from_millis(10)));
    }

    #[test]
    fn sub_point_delta_within_interval_is_suppressed() {
        let mut limiter = ProgressLimiter::new();
        let t0 = Instant::now();
        assert!(limiter.should_write(10, t0));
        // abs_diff(10, 10) == 0 < MIN_DELTA_PCT
        assert!(!limiter.should_write(10, t0 + Duration::from_millis(10)));
    }
}
