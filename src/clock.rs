use std::time::{Duration, Instant};

pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

/// Countdown source for a session.
///
/// The clock is a deadline rather than a timer thread: whoever waits for
/// events asks it how long to wait and polls it afterwards. Stopping it just
/// drops the deadline, so nothing can fire after a session ends.
#[derive(Debug, Clone)]
pub struct SessionClock {
    interval: Duration,
    next_tick: Option<Instant>,
}

impl SessionClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_tick: None,
        }
    }

    /// Arms the clock; the first tick is due one interval after `now`.
    /// Starting a running clock replaces its deadline.
    pub fn start(&mut self, now: Instant) {
        self.next_tick = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_tick = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.next_tick
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns true when a tick is due and schedules the next one.
    ///
    /// At most one tick is produced per call; a loop that fell behind gets
    /// the missed ticks on its following polls.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(deadline) if now >= deadline => {
                self.next_tick = Some(deadline + self.interval);
                true
            }
            _ => false,
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new(COUNTDOWN_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_clock_never_ticks() {
        let mut clock = SessionClock::default();
        let now = Instant::now();

        assert!(!clock.is_running());
        assert!(!clock.poll(now + Duration::from_secs(10)));
        assert_eq!(clock.time_until_tick(now), None);
    }

    #[test]
    fn ticks_once_per_interval() {
        let mut clock = SessionClock::new(Duration::from_secs(1));
        let base = Instant::now();
        clock.start(base);

        assert!(!clock.poll(base + Duration::from_millis(999)));
        assert!(clock.poll(base + Duration::from_secs(1)));
        assert!(!clock.poll(base + Duration::from_millis(1500)));
        assert!(clock.poll(base + Duration::from_secs(2)));
    }

    #[test]
    fn catches_up_one_tick_per_poll() {
        let mut clock = SessionClock::new(Duration::from_secs(1));
        let base = Instant::now();
        clock.start(base);

        let late = base + Duration::from_millis(3500);
        assert!(clock.poll(late));
        assert!(clock.poll(late));
        assert!(clock.poll(late));
        assert!(!clock.poll(late));
    }

    #[test]
    fn stop_cancels_pending_tick() {
        let mut clock = SessionClock::default();
        let base = Instant::now();
        clock.start(base);
        clock.stop();

        assert!(!clock.poll(base + Duration::from_secs(5)));
    }

    #[test]
    fn time_until_tick_saturates() {
        let mut clock = SessionClock::new(Duration::from_millis(100));
        let base = Instant::now();
        clock.start(base);

        assert_eq!(
            clock.time_until_tick(base),
            Some(Duration::from_millis(100))
        );
        assert_eq!(
            clock.time_until_tick(base + Duration::from_secs(1)),
            Some(Duration::ZERO)
        );
    }
}
