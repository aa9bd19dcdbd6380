//! Transient notifications stacked in a corner of the screen.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::services::Notice;

/// How long a toast stays up.
pub const TOAST_TTL: Duration = Duration::from_secs(5);

const MAX_TOASTS: usize = 4;

#[derive(Debug, Default)]
pub struct Toasts {
    items: VecDeque<(Notice, Instant)>,
}

impl Toasts {
    pub fn push(&mut self, notice: Notice, now: Instant) {
        if self.items.len() == MAX_TOASTS {
            self.items.pop_front();
        }
        self.items.push_back((notice, now + TOAST_TTL));
    }

    /// Drop expired toasts.
    pub fn expire(&mut self, now: Instant) {
        self.items.retain(|(_, until)| *until > now);
    }

    /// Newest last.
    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter().map(|(n, _)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toasts_expire() {
        let now = Instant::now();
        let mut toasts = Toasts::default();
        toasts.push(Notice::success("saved"), now);
        toasts.expire(now + Duration::from_secs(1));
        assert_eq!(toasts.visible().count(), 1);
        toasts.expire(now + TOAST_TTL);
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_oldest_toast_dropped_when_full() {
        let now = Instant::now();
        let mut toasts = Toasts::default();
        for i in 0..=MAX_TOASTS {
            toasts.push(Notice::info(i.to_string()), now);
        }
        let messages: Vec<_> = toasts.visible().map(|n| n.message.as_str()).collect();
        assert_eq!(messages.first(), Some(&"1"));
        assert_eq!(messages.len(), MAX_TOASTS);
    }
}
