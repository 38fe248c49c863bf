//! Exponential backoff between connection attempts.

use std::time::Duration;

/// Wait before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

const MIN_DELAY: Duration = Duration::from_millis(1);

/// Unbounded doubling delay sequence: `initial, 2*initial, 4*initial, ...`.
///
/// Never runs out; saturates at `Duration::MAX` instead of overflowing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    next: Duration,
}

impl Backoff {
    pub fn new(initial: Duration) -> Self {
        Self {
            next: initial.max(MIN_DELAY),
        }
    }

    /// Delay to wait before the next attempt.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = self.next.saturating_mul(2);
        delay
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_DELAY)
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}
