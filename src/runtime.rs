use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

use crate::clock::{Clock, SystemClock};

/// How often the event loop wakes up when no input arrives
pub const TICK_RATE_MS: u64 = 100;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum DrillEvent {
    Key(KeyEvent),
    Resize,
    /// Time that really passed since the previous tick, for the running countdown
    Tick(Duration),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError>;
}

/// Production event source reading crossterm events on a background thread
pub struct CrosstermEventSource {
    rx: Receiver<DrillEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                // Release/repeat events would double every keypress on some terminals.
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                    tx.send(DrillEvent::Key(key))
                }
                Ok(CtEvent::Resize(_, _)) => tx.send(DrillEvent::Resize),
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

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
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

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(TICK_RATE_MS))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel, for headless tests
pub struct TestEventSource {
    rx: Receiver<DrillEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<DrillEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<DrillEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time.
///
/// A tick is due once an interval has passed on the clock, even while keys keep
/// arriving, so a burst of presses cannot stall the countdown.
pub struct Runner<E: EventSource, T: Ticker, C: Clock = SystemClock> {
    event_source: E,
    ticker: T,
    clock: C,
    last_tick: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self::with_clock(event_source, ticker, SystemClock)
    }
}

impl<E: EventSource, T: Ticker, C: Clock> Runner<E, T, C> {
    pub fn with_clock(event_source: E, ticker: T, clock: C) -> Self {
        let last_tick = clock.now();
        Self {
            event_source,
            ticker,
            clock,
            last_tick,
        }
    }

    /// Blocks until the next event or the next tick, whichever comes first
    pub fn step(&mut self) -> DrillEvent {
        let interval = self.ticker.interval();
        let since = self.clock.now().saturating_duration_since(self.last_tick);
        if since >= interval {
            return self.tick();
        }

        let wait = interval - since;
        match self.event_source.recv_timeout(wait) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => self.tick(),
            Err(RecvTimeoutError::Disconnected) => {
                std::thread::sleep(wait);
                self.tick()
            }
        }
    }

    fn tick(&mut self) -> DrillEvent {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_tick);
        self.last_tick = now;
        DrillEvent::Tick(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::clock::ManualClock;
    use assert_matches::assert_matches;
    use crossterm::event::{KeyCode, KeyModifiers};

    const INTERVAL: Duration = Duration::from_millis(100);

    fn key(c: char) -> DrillEvent {
        DrillEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[test]
    fn step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let mut runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );

        assert!(matches!(runner.step(), DrillEvent::Tick(_)));
    }

    #[test]
    fn step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(DrillEvent::Resize).unwrap();
        let mut runner = Runner::with_clock(
            TestEventSource::new(rx),
            FixedTicker::new(INTERVAL),
            ManualClock::new(),
        );

        assert!(matches!(runner.step(), DrillEvent::Resize));
    }

    #[test]
    fn tick_reports_clock_time_since_previous_tick() {
        let (_tx, rx) = mpsc::channel();
        let clock = ManualClock::new();
        let mut runner = Runner::with_clock(
            TestEventSource::new(rx),
            FixedTicker::new(INTERVAL),
            clock.clone(),
        );

        clock.advance(Duration::from_millis(250));
        assert_matches!(runner.step(), DrillEvent::Tick(d) if d == Duration::from_millis(250));
        clock.advance(INTERVAL);
        assert_matches!(runner.step(), DrillEvent::Tick(d) if d == INTERVAL);
    }

    #[test]
    fn key_burst_does_not_hold_back_due_tick() {
        let (tx, rx) = mpsc::channel();
        for c in ['1', '2', '3'] {
            tx.send(key(c)).unwrap();
        }
        let clock = ManualClock::new();
        let mut runner = Runner::with_clock(
            TestEventSource::new(rx),
            FixedTicker::new(INTERVAL),
            clock.clone(),
        );

        assert_matches!(runner.step(), DrillEvent::Key(_));
        clock.advance(INTERVAL);
        assert_matches!(runner.step(), DrillEvent::Tick(d) if d == INTERVAL);
        assert_matches!(runner.step(), DrillEvent::Key(_));
        assert_matches!(runner.step(), DrillEvent::Key(_));
    }

    #[test]
    fn default_ticker_uses_tick_rate() {
        assert_eq!(
            FixedTicker::default().interval(),
            Duration::from_millis(TICK_RATE_MS)
        );
    }
}
