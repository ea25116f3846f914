//! # Debounced Input
//!
//! Free-text inputs settle for a moment before the engine acts on them.
//! The debouncer is latest-wins: resubmitting before the deadline replaces
//! the pending value and pushes the deadline out, so a fast typist commits
//! exactly one value.
//!
//! Time is explicit. The driver reads [`Debouncer::deadline`] to know when
//! to wake up and calls [`Debouncer::take_ready`] once it has.

use std::time::{Duration, Instant};

use spigot_core::constants::DEFAULT_DEBOUNCE_MS;

/// Latest-wins value holder with an explicit deadline.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Creates a debouncer with the given settle delay.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Records a value. Any previously pending value is replaced and the
    /// deadline restarts from `now`.
    pub fn submit(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Deadline of the pending value, if one is waiting.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Takes the pending value once its deadline has passed.
    pub fn take_ready(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref().is_some_and(|(_, deadline)| *deadline <= now) {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_not_ready_before_deadline() {
        let mut debouncer = Debouncer::default();
        let t0 = Instant::now();
        debouncer.submit("a", t0);

        assert_eq!(debouncer.take_ready(t0 + Duration::from_millis(499)), None);
        assert_eq!(debouncer.take_ready(t0 + Duration::from_millis(500)), Some("a"));
    }

    #[test]
    fn test_resubmit_replaces_value_and_pushes_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let t0 = Instant::now();
        debouncer.submit("first", t0);
        debouncer.submit("second", t0 + Duration::from_millis(80));

        // The first deadline has passed, but the resubmission moved it.
        assert_eq!(debouncer.take_ready(t0 + Duration::from_millis(120)), None);
        assert_eq!(
            debouncer.take_ready(t0 + Duration::from_millis(180)),
            Some("second")
        );
    }

    #[test]
    fn test_take_drains_the_pending_value() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        let t0 = Instant::now();
        debouncer.submit(1, t0);

        let later = t0 + Duration::from_millis(20);
        assert_eq!(debouncer.take_ready(later), Some(1));
        assert_eq!(debouncer.take_ready(later), None);
        assert_eq!(debouncer.deadline(), None);
    }

    #[test]
    fn test_deadline_exposed_while_pending() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let t0 = Instant::now();
        assert_eq!(debouncer.deadline(), None);

        debouncer.submit("x", t0);
        assert_eq!(debouncer.deadline(), Some(t0 + Duration::from_millis(100)));
    }
}
