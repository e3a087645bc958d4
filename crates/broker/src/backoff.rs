//! Reconnect back-off
//!
//! Exponential with a cap: `base, 2*base, 4*base, ... max, max, ...`.
//! Reset on a healthy connection so a later outage starts from the base
//! delay again.

use std::time::Duration;

/// Capped exponential back-off state
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    /// Create a back-off starting at `base` and capped at `max`
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base: base.max(Duration::from_millis(1)),
            max,
            attempt: 0,
        }
    }

    /// The delay to wait before the next attempt
    ///
    /// Each call advances the schedule.
    pub fn next(&mut self) -> Duration {
        let factor = 1u32 << self.attempt.min(16);
        let delay = self.base.saturating_mul(factor).min(self.max);
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    /// Number of attempts since the last reset
    #[inline]
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Start over from the base delay
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
