// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Delay-coalescing timer.

use std::time::{Duration, Instant};

/// Coalesces bursts of triggers into one firing per quiet period.
///
/// `trigger` arms (or re-arms) the timer `delay` after the call; any earlier
/// pending firing is discarded. At most one firing is ever outstanding, and
/// it carries the value of the most recent trigger. The owner drives time by
/// calling [`Debouncer::fire`]; that call is where the deferred callback runs.
#[derive(Debug, Clone)]
pub struct Debouncer<T = ()> {
    delay: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    /// Create an idle debouncer.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Quiet period required before firing.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Restart the wait from `now`, replacing any pending value.
    pub fn trigger(&mut self, now: Instant, value: T) {
        self.pending = Some((now + self.delay, value));
    }

    /// Discard the pending firing. Returns whether one was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Whether a firing is outstanding.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending firing is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Take the pending value if its deadline has passed.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((at, _)) if now >= *at => self.pending.take().map(|(_, value)| value),
            _ => None,
        }
    }
}
