use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::clock::SessionClock;

/// How long to wait for input while no clock is running.
const IDLE_POLL: Duration = Duration::from_millis(250);

/// Unified event type consumed by the app loop
#[derive(Clone, Debug)]
pub enum ClackEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The event source hung up; no more events will arrive.
    Closed,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait ClackEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<ClackEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<ClackEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(ClackEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(ClackEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ClackEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ClackEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Event source fed from a channel, for tests and headless driving
pub struct TestEventSource {
    rx: Receiver<ClackEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<ClackEvent>) -> Self {
        Self { rx }
    }
}

impl ClackEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<ClackEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Merges terminal events and session clock deadlines into one stream
pub struct Runner<E: ClackEventSource> {
    event_source: E,
}

impl<E: ClackEventSource> Runner<E> {
    pub fn new(event_source: E) -> Self {
        Self { event_source }
    }

    /// Blocks until the next event or clock tick, whichever comes first.
    ///
    /// A due tick is returned before any queued input so a steady stream of
    /// keys cannot hold the countdown back.
    pub fn step(&self, clock: &mut SessionClock) -> ClackEvent {
        loop {
            let now = Instant::now();
            if clock.poll(now) {
                return ClackEvent::Tick;
            }

            let wait = clock.time_until_tick(now).unwrap_or(IDLE_POLL);
            match self.event_source.recv_timeout(wait) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return ClackEvent::Closed,
            }
        }
    }
}
