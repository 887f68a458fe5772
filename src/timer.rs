use std::time::Duration;

/// What a countdown reports after being fed elapsed time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownSignal {
    /// Disarmed, stale, or less than a whole second has accumulated.
    Idle,
    /// One or more whole seconds elapsed and time is left.
    Tick { remaining: u32 },
    /// Reached zero. Reported once, after which the countdown is disarmed.
    Expired,
}

/// Cancellable one-second-resolution countdown.
///
/// The countdown is passive: the owner feeds it elapsed time from its event loop and
/// reacts to the returned [`CountdownSignal`]. Once [`Countdown::disarm`] returns, no
/// further `Tick` or `Expired` is produced until the countdown is armed again.
#[derive(Debug, Default)]
pub struct Countdown {
    remaining: Option<u32>,
    carry: Duration,
    epoch: u64,
}

impl Countdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting down from `duration_secs`, replacing any countdown in flight.
    /// Returns the epoch identifying this arming.
    pub fn arm(&mut self, duration_secs: u32) -> u64 {
        self.epoch += 1;
        self.carry = Duration::ZERO;
        self.remaining = Some(duration_secs);
        self.epoch
    }

    /// Stop the countdown. Calling it on a disarmed countdown does nothing.
    pub fn disarm(&mut self) {
        if self.remaining.take().is_some() {
            self.epoch += 1;
        }
        self.carry = Duration::ZERO;
    }

    pub fn is_armed(&self) -> bool {
        self.remaining.is_some()
    }

    pub fn remaining(&self) -> Option<u32> {
        self.remaining
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Feed elapsed wall time into the countdown.
    pub fn advance(&mut self, elapsed: Duration) -> CountdownSignal {
        let Some(remaining) = self.remaining else {
            return CountdownSignal::Idle;
        };

        self.carry += elapsed;
        let whole_secs = self.carry.as_secs();
        if whole_secs == 0 {
            return CountdownSignal::Idle;
        }
        self.carry -= Duration::from_secs(whole_secs);

        let whole_secs = u32::try_from(whole_secs).unwrap_or(u32::MAX);
        let remaining = remaining.saturating_sub(whole_secs);
        if remaining == 0 {
            self.remaining = None;
            self.carry = Duration::ZERO;
            CountdownSignal::Expired
        } else {
            self.remaining = Some(remaining);
            CountdownSignal::Tick { remaining }
        }
    }

    /// Like [`Countdown::advance`], but ignores time addressed to an earlier arming.
    pub fn advance_for(&mut self, epoch: u64, elapsed: Duration) -> CountdownSignal {
        if epoch != self.epoch {
            return CountdownSignal::Idle;
        }
        self.advance(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEC: Duration = Duration::from_secs(1);

    #[test]
    fn unarmed_countdown_is_idle() {
        let mut countdown = Countdown::new();
        assert!(!countdown.is_armed());
        assert_eq!(countdown.advance(SEC * 5), CountdownSignal::Idle);
    }

    #[test]
    fn ticks_once_per_whole_second() {
        let mut countdown = Countdown::new();
        countdown.arm(3);

        assert_eq!(countdown.advance(SEC), CountdownSignal::Tick { remaining: 2 });
        assert_eq!(countdown.remaining(), Some(2));
        assert_eq!(countdown.advance(SEC), CountdownSignal::Tick { remaining: 1 });
        assert_eq!(countdown.advance(SEC), CountdownSignal::Expired);
        assert!(!countdown.is_armed());
    }

    #[test]
    fn sub_second_ticks_accumulate() {
        let mut countdown = Countdown::new();
        countdown.arm(2);

        for _ in 0..9 {
            assert_eq!(
                countdown.advance(Duration::from_millis(100)),
                CountdownSignal::Idle
            );
        }
        assert_eq!(
            countdown.advance(Duration::from_millis(100)),
            CountdownSignal::Tick { remaining: 1 }
        );
    }

    #[test]
    fn expires_exactly_once() {
        let mut countdown = Countdown::new();
        countdown.arm(1);

        assert_eq!(countdown.advance(SEC * 4), CountdownSignal::Expired);
        assert_eq!(countdown.advance(SEC), CountdownSignal::Idle);
        assert_eq!(countdown.advance(SEC), CountdownSignal::Idle);
    }

    #[test]
    fn disarm_is_idempotent_and_silences_ticks() {
        let mut countdown = Countdown::new();
        countdown.arm(10);
        countdown.advance(Duration::from_millis(900));

        countdown.disarm();
        countdown.disarm();

        assert!(!countdown.is_armed());
        assert_eq!(countdown.advance(SEC * 20), CountdownSignal::Idle);
    }

    #[test]
    fn rearm_resets_carry() {
        let mut countdown = Countdown::new();
        countdown.arm(5);
        countdown.advance(Duration::from_millis(900));

        countdown.arm(5);
        assert_eq!(
            countdown.advance(Duration::from_millis(200)),
            CountdownSignal::Idle
        );
        assert_eq!(countdown.remaining(), Some(5));
    }

    #[test]
    fn stale_epoch_is_ignored() {
        let mut countdown = Countdown::new();
        let first = countdown.arm(5);
        countdown.disarm();
        let second = countdown.arm(5);
        assert_ne!(first, second);

        assert_eq!(countdown.advance_for(first, SEC), CountdownSignal::Idle);
        assert_eq!(
            countdown.advance_for(second, SEC),
            CountdownSignal::Tick { remaining: 4 }
        );
    }
}
