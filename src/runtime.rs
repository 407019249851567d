use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait QuizEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<QuizEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            match event::read() {
                Ok(CtEvent::Key(key)) => {
                    if tx.send(QuizEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if tx.send(QuizEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
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

impl QuizEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<QuizEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: QuizEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: QuizEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> QuizEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => QuizEvent::Tick,
        }
    }
}

/// Per-question countdown driven by ticks. Each start hands out a new
/// generation token; ticks carrying a stale token are no-ops, so a timer
/// cancelled before a new question (or on teardown) can never expire
/// against the wrong question state.
#[derive(Debug, Default)]
pub struct Countdown {
    seconds_left: f64,
    generation: u64,
    running: bool,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a countdown and return the token ticks must present.
    pub fn start(&mut self, secs: f64) -> u64 {
        self.generation += 1;
        self.seconds_left = secs;
        self.running = true;
        self.generation
    }

    /// Invalidate the active countdown and all outstanding tokens.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.running = false;
    }

    /// Advance the countdown by `dt_secs`. Returns true exactly once,
    /// on the tick that expires it.
    pub fn tick(&mut self, token: u64, dt_secs: f64) -> bool {
        if !self.running || token != self.generation {
            return false;
        }
        self.seconds_left -= dt_secs;
        if self.seconds_left <= 0.0 {
            self.running = false;
            return true;
        }
        false
    }

    pub fn seconds_left(&self) -> Option<f64> {
        if self.running {
            Some(self.seconds_left.max(0.0))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        // With no events available, step should yield Tick
        let ev = runner.step();
        match ev {
            QuizEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(QuizEvent::Resize).unwrap();
        let es = TestEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            QuizEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn countdown_expires_once() {
        let mut countdown = Countdown::new();
        let token = countdown.start(0.3);

        assert!(!countdown.tick(token, 0.1));
        assert!(!countdown.tick(token, 0.1));
        assert!(countdown.tick(token, 0.1));
        // Expired countdowns stay expired
        assert!(!countdown.tick(token, 0.1));
        assert_eq!(countdown.seconds_left(), None);
    }

    #[test]
    fn cancelled_countdown_ignores_stale_ticks() {
        let mut countdown = Countdown::new();
        let stale = countdown.start(0.1);
        countdown.cancel();

        // A late tick with the old token must not fire
        assert!(!countdown.tick(stale, 1.0));
        assert_eq!(countdown.seconds_left(), None);
    }

    #[test]
    fn restart_invalidates_previous_token() {
        let mut countdown = Countdown::new();
        let first = countdown.start(0.1);
        let second = countdown.start(10.0);

        assert!(!countdown.tick(first, 1.0));
        assert_eq!(countdown.seconds_left(), Some(10.0));
        assert!(!countdown.tick(second, 0.5));
        assert_eq!(countdown.seconds_left(), Some(9.5));
    }
}
