use std::time::Instant;

use tracing::warn;

use crate::clock::SessionClock;
use crate::recorder::{RecorderError, ResultRecorder};
use crate::session::{Session, SessionEvent, Transition};

/// Owns a session together with its clock and result recorder.
///
/// Every event goes through [`SessionDriver::dispatch`], which applies it,
/// then arms or stops the clock to match the new lifecycle, then forwards a
/// freshly completed result. The clock is therefore running exactly while the
/// session is active by the time `dispatch` returns.
#[derive(Debug)]
pub struct SessionDriver<R: ResultRecorder> {
    session: Session,
    clock: SessionClock,
    recorder: R,
}

impl<R: ResultRecorder> SessionDriver<R> {
    pub fn new(session: Session, clock: SessionClock, recorder: R) -> Self {
        Self {
            session,
            clock,
            recorder,
        }
    }

    pub fn dispatch(&mut self, event: SessionEvent) -> Result<Transition, RecorderError> {
        self.dispatch_at(event, Instant::now())
    }

    /// Applies `event` as of `now`.
    ///
    /// A recorder failure is returned as an error, but the session has
    /// completed regardless and the result is not offered again.
    pub fn dispatch_at(
        &mut self,
        event: SessionEvent,
        now: Instant,
    ) -> Result<Transition, RecorderError> {
        let transition = self.session.apply(event, now);
        self.sync_clock(now);

        if let Some(result) = self.session.take_result() {
            if let Err(err) = self.recorder.record(result) {
                warn!(target: "recorder", error = %err, "failed to record result");
                return Err(err);
            }
        }

        Ok(transition)
    }

    fn sync_clock(&mut self, now: Instant) {
        if self.session.is_active() {
            if !self.clock.is_running() {
                self.clock.start(now);
            }
        } else {
            self.clock.stop();
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SessionClock {
        &mut self.clock
    }

    pub fn recorder(&self) -> &R {
        &self.recorder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::MemoryRecorder;
    use crate::session::{CompletionCause, Lifecycle, TestResult};
    use assert_matches::assert_matches;
    use std::time::Duration;

    struct FailingRecorder {
        attempts: usize,
    }

    impl ResultRecorder for FailingRecorder {
        fn record(&mut self, _result: TestResult) -> Result<(), RecorderError> {
            self.attempts += 1;
            Err(RecorderError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )))
        }
    }

    fn driver(target: &str, limit: u32) -> SessionDriver<MemoryRecorder> {
        SessionDriver::new(
            Session::new(target, limit),
            SessionClock::default(),
            MemoryRecorder::new(),
        )
    }

    #[test]
    fn clock_runs_only_while_active() {
        let base = Instant::now();
        let mut driver = driver("cat dog", 30);
        assert!(!driver.clock().is_running());

        driver.dispatch_at(SessionEvent::Input("c".into()), base).unwrap();
        assert!(driver.clock().is_running());
        assert_eq!(
            driver.clock().time_until_tick(base),
            Some(Duration::from_secs(1))
        );

        driver.dispatch_at(SessionEvent::Reset, base).unwrap();
        assert!(!driver.clock().is_running());
    }

    #[test]
    fn input_does_not_rearm_running_clock() {
        let base = Instant::now();
        let mut driver = driver("cat dog", 30);
        driver.dispatch_at(SessionEvent::Start, base).unwrap();

        let later = base + Duration::from_millis(700);
        driver.dispatch_at(SessionEvent::Input("ca".into()), later).unwrap();

        assert_eq!(
            driver.clock().time_until_tick(later),
            Some(Duration::from_millis(300))
        );
    }

    #[test]
    fn completion_records_once_and_stops_clock() {
        let base = Instant::now();
        let mut driver = driver("cat", 30);
        driver.dispatch_at(SessionEvent::Start, base).unwrap();

        let t = driver
            .dispatch_at(SessionEvent::Input("cat".into()), base + Duration::from_secs(2))
            .unwrap();
        assert_eq!(t, Transition::Completed(CompletionCause::TextComplete));
        assert!(!driver.clock().is_running());

        driver
            .dispatch_at(SessionEvent::Tick, base + Duration::from_secs(3))
            .unwrap();
        driver
            .dispatch_at(SessionEvent::Input("cat".into()), base + Duration::from_secs(3))
            .unwrap();

        assert_eq!(driver.recorder().results().len(), 1);
        assert_eq!(driver.recorder().results()[0].wpm, 18);
    }

    #[test]
    fn timeout_records_result() {
        let base = Instant::now();
        let mut driver = driver("cat dog", 2);
        driver.dispatch_at(SessionEvent::Input("cat".into()), base).unwrap();

        driver
            .dispatch_at(SessionEvent::Tick, base + Duration::from_secs(1))
            .unwrap();
        let t = driver
            .dispatch_at(SessionEvent::Tick, base + Duration::from_secs(2))
            .unwrap();

        assert_eq!(t, Transition::Completed(CompletionCause::TimeUp));
        assert_eq!(driver.session().lifecycle(), Lifecycle::Complete);
        assert!(!driver.clock().is_running());
        assert_eq!(driver.recorder().results().len(), 1);
        assert_eq!(driver.recorder().results()[0].time_limit, 2);
    }

    #[test]
    fn recorder_failure_is_surfaced_without_undoing_completion() {
        let base = Instant::now();
        let mut driver = SessionDriver::new(
            Session::new("cat", 30),
            SessionClock::default(),
            FailingRecorder { attempts: 0 },
        );

        let outcome = driver.dispatch_at(SessionEvent::Input("cat".into()), base);

        assert_matches!(outcome, Err(RecorderError::Io(_)));
        assert!(driver.session().is_complete());
        assert!(driver.session().result().is_some());
        assert!(!driver.clock().is_running());

        // no retry on later events
        driver.dispatch_at(SessionEvent::Tick, base).unwrap();
        assert_eq!(driver.recorder().attempts, 1);
    }

    #[test]
    fn restart_after_completion_rearms_clock() {
        let base = Instant::now();
        let mut driver = driver("cat", 30);
        driver.dispatch_at(SessionEvent::Input("cat".into()), base).unwrap();
        driver.dispatch_at(SessionEvent::Reset, base).unwrap();

        let later = base + Duration::from_secs(10);
        driver.dispatch_at(SessionEvent::Start, later).unwrap();

        assert!(driver.clock().is_running());
        assert_eq!(driver.clock().time_until_tick(later), Some(Duration::from_secs(1)));
        assert_eq!(driver.session().time_remaining(), 30);
    }
}
