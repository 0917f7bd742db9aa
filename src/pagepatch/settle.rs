//! Debounced "page settled" detection.
//!
//! Host pages keep mutating for a while after load (late scripts, lazy
//! widgets). Replay waits until no mutation has been observed for a quiet
//! period, then fires once. The caller owns the clock: every method takes
//! `now`, and [`SettleDetector::poll`] is driven from the host's timer.

use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone)]
pub struct SettleDetector {
    delay: Duration,
    deadline: Option<Instant>,
    fired: bool,
}

impl Default for SettleDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl SettleDetector {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            fired: false,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts (or restarts) the quiet period. No-op once fired.
    pub fn arm(&mut self, now: Instant) {
        if self.fired {
            return;
        }
        self.deadline = Some(now + self.delay);
    }

    /// Replaces any pending deadline with `now + delay`.
    pub fn notify_mutation(&mut self, now: Instant) {
        if self.fired {
            return;
        }
        if self.deadline.is_some() {
            debug!("mutation during settle period, re-arming");
        }
        self.arm(now);
    }

    /// True exactly once: on the first poll at or after the deadline.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.fired = true;
                true
            }
            _ => false,
        }
    }

    /// Drops the pending deadline without latching.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}
