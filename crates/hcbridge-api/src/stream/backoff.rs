// Reconnect backoff and STOP grace tracking for one stream connection.

use std::time::Duration;

use tokio::time::Instant;

/// Doubling reconnect interval, clamped to a ceiling.
///
/// `next_delay` hands out the current interval and doubles it for the
/// following attempt; `reset` returns to the base after a successful
/// connection.
#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        let base = base.min(max);
        Self {
            base,
            max,
            current: base,
        }
    }

    /// Interval the next reconnect will wait.
    pub fn current(&self) -> Duration {
        self.current
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.base;
    }
}

/// Deadline tracking for STOP signals.
///
/// A STOP arms a deadline `grace` in the future; a START before the
/// deadline disarms it. Only an expired deadline counts as a real drop.
#[derive(Debug, Clone)]
pub struct StopGrace {
    grace: Duration,
    deadline: Option<Instant>,
}

impl StopGrace {
    pub fn new(grace: Duration) -> Self {
        Self {
            grace,
            deadline: None,
        }
    }

    /// Arm the deadline. A STOP while already armed keeps the first deadline.
    pub fn stop(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.grace);
        }
    }

    /// Disarm. Returns `true` if a pending STOP was cancelled.
    pub fn start(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_ceiling() {
        let mut backoff = Backoff::new(Duration::from_secs(15), Duration::from_secs(900));
        let delays: Vec<u64> = (0..9).map(|_| backoff.next_delay().as_secs()).collect();
        assert_eq!(delays, vec![15, 30, 60, 120, 240, 480, 900, 900, 900]);
    }

    #[test]
    fn backoff_resets_to_base() {
        let mut backoff = Backoff::new(Duration::from_secs(15), Duration::from_secs(900));
        backoff.next_delay();
        backoff.next_delay();
        assert_eq!(backoff.current(), Duration::from_secs(60));

        backoff.reset();
        assert_eq!(backoff.current(), Duration::from_secs(15));
    }

    #[test]
    fn start_within_grace_cancels_stop() {
        let t0 = Instant::now();
        let mut grace = StopGrace::new(Duration::from_secs(30));
        grace.stop(t0);
        assert!(!grace.is_expired(t0 + Duration::from_secs(10)));
        assert!(grace.start());
        assert!(!grace.is_expired(t0 + Duration::from_secs(60)));
        assert!(grace.deadline().is_none());
    }

    #[test]
    fn stop_without_start_expires_after_grace() {
        let t0 = Instant::now();
        let mut grace = StopGrace::new(Duration::from_secs(30));
        grace.stop(t0);
        grace.stop(t0 + Duration::from_secs(20));
        assert!(!grace.is_expired(t0 + Duration::from_secs(29)));
        assert!(grace.is_expired(t0 + Duration::from_secs(30)));
    }

    #[test]
    fn start_without_stop_is_a_no_op() {
        let mut grace = StopGrace::new(Duration::from_secs(30));
        assert!(!grace.start());
    }
}
