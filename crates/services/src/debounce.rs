//! Cancellable debounce deadline on the logical clock.
//!
//! The engine re-arms this on every mutation, so a burst of edits (rapid note
//! keystrokes) coalesces into a single remote write. The timer, not the push,
//! decides what gets sent: whatever the record holds when the deadline fires.

use chrono::{DateTime, Duration, Utc};

/// Delay between the last mutation and the remote write it schedules.
pub const DEBOUNCE_DELAY_MS: i64 = 700;

/// A single re-armable deadline. Arming while armed restarts the window.
#[derive(Debug, Clone)]
pub struct DebounceTimer {
    delay: Duration,
    deadline: Option<DateTime<Utc>>,
}

impl Default for DebounceTimer {
    fn default() -> Self {
        Self::new(Duration::milliseconds(DEBOUNCE_DELAY_MS))
    }
}

impl DebounceTimer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Start (or restart) the window from `now`.
    pub fn arm(&mut self, now: DateTime<Utc>) {
        self.deadline = Some(now + self.delay);
    }

    /// Drop any pending deadline.
    pub fn cancel_if_armed(&mut self) {
        self.deadline = None;
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Whether the armed deadline has elapsed at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::time::fixed_now;

    #[test]
    fn fires_only_after_the_delay() {
        let mut timer = DebounceTimer::default();
        let start = fixed_now();
        assert!(!timer.is_due(start));

        timer.arm(start);
        assert!(timer.is_armed());
        assert!(!timer.is_due(start + Duration::milliseconds(699)));
        assert!(timer.is_due(start + Duration::milliseconds(700)));
    }

    #[test]
    fn re_arming_restarts_the_window() {
        let mut timer = DebounceTimer::default();
        let start = fixed_now();

        timer.arm(start);
        let second = start + Duration::milliseconds(500);
        timer.arm(second);

        assert!(!timer.is_due(start + Duration::milliseconds(700)));
        assert!(timer.is_due(second + Duration::milliseconds(700)));
    }

    #[test]
    fn cancel_disarms() {
        let mut timer = DebounceTimer::default();
        timer.arm(fixed_now());
        timer.cancel_if_armed();
        assert!(!timer.is_armed());
        assert!(!timer.is_due(fixed_now() + Duration::days(1)));
    }
}
