//! Single-slot debounce timer for search input.
//!
//! Every `push` replaces the pending value and restarts the quiet interval;
//! `poll` hands the value out once the interval has elapsed since the last
//! push. Superseded values are dropped, never delivered.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the timer at `now`.
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value if its quiet interval has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    /// Time left before the pending value fires.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending value without firing.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
