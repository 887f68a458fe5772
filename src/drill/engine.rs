use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, info, trace};

use super::point::{DecisionPoint, Judge, Judgment};
use super::scoring;
use super::sequence::{Pacing, Sequence};
use crate::clock::{Clock, SystemClock};
use crate::timer::{Countdown, CountdownSignal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    Counting,
    Resolved,
    Complete,
}

/// How one point was resolved
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PointOutcome {
    pub point_id: String,
    pub response: Option<usize>,
    pub judgment: Judgment,
    pub remaining_secs: u32,
    pub contribution: u32,
}

/// Reported once when the last point is advanced past
#[derive(Clone, Debug, PartialEq)]
pub struct Completion {
    pub final_score: u8,
    pub elapsed: Duration,
    pub correct: usize,
    pub total: usize,
    pub finished_at: DateTime<Local>,
}

impl Completion {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn is_perfect(&self) -> bool {
        self.correct == self.total
    }
}

/// Result of calling [`DrillEngine::advance`]
#[derive(Clone, Debug, PartialEq)]
pub enum Advance {
    /// Not in `Resolved`; nothing changed.
    Ignored,
    /// Moved on to the point at `index`.
    Next { index: usize },
    /// The run is over.
    Completed(Completion),
}

type CompletionListener = Box<dyn FnMut(&Completion)>;

/// Timed decision engine driving one run through a [`Sequence`].
///
/// All transitions happen on the caller's thread. Invalid transitions are no-ops, and
/// every path out of `Counting` disarms the countdown first.
pub struct DrillEngine<C: Clock = SystemClock> {
    sequence: Arc<Sequence>,
    clock: C,
    countdown: Countdown,
    phase: Phase,
    current_index: usize,
    remaining_secs: u32,
    submitted: Option<usize>,
    accumulated: u32,
    correct: usize,
    outcomes: Vec<PointOutcome>,
    started_at: Option<Instant>,
    completion: Option<Completion>,
    listener: Option<CompletionListener>,
}

impl DrillEngine<SystemClock> {
    pub fn new(sequence: Arc<Sequence>) -> Self {
        Self::with_clock(sequence, SystemClock)
    }
}

impl<C: Clock> DrillEngine<C> {
    pub fn with_clock(sequence: Arc<Sequence>, clock: C) -> Self {
        Self {
            sequence,
            clock,
            countdown: Countdown::new(),
            phase: Phase::NotStarted,
            current_index: 0,
            remaining_secs: 0,
            submitted: None,
            accumulated: 0,
            correct: 0,
            outcomes: Vec::new(),
            started_at: None,
            completion: None,
            listener: None,
        }
    }

    /// Register the completion callback, replacing any previous one.
    pub fn on_complete(&mut self, listener: impl FnMut(&Completion) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Arm the countdown for the current point. Returns false when not `NotStarted`.
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::NotStarted {
            return false;
        }
        let Some(point) = self.sequence.get(self.current_index) else {
            return false;
        };
        let limit = point.time_limit_secs;

        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
        }
        self.submitted = None;
        self.remaining_secs = limit;
        let epoch = self.countdown.arm(limit);
        self.phase = Phase::Counting;

        debug!(
            point = %point.id,
            index = self.current_index,
            limit,
            epoch,
            "decision point armed"
        );
        true
    }

    /// Submit the candidate at `response`. The first submission per point wins;
    /// anything outside `Counting` or out of range is ignored.
    pub fn submit(&mut self, response: usize) -> Option<Judgment> {
        if self.phase != Phase::Counting || self.submitted.is_some() {
            return None;
        }
        let point = self.sequence.get(self.current_index)?;
        let judgment = point
            .responses
            .judge(response, self.sequence.action_match())?;
        let contribution = scoring::point_contribution(
            self.sequence.mode(),
            judgment,
            self.remaining_secs,
            point.time_limit_secs,
        );

        self.countdown.disarm();
        self.resolve(Some(response), judgment, contribution);
        Some(judgment)
    }

    /// Resolve the current point as unanswered. Returns false outside `Counting`.
    pub fn expire(&mut self) -> bool {
        if self.phase != Phase::Counting || self.submitted.is_some() {
            return false;
        }
        self.countdown.disarm();
        self.remaining_secs = 0;
        self.resolve(None, Judgment::Unanswered, 0);
        true
    }

    /// Feed elapsed time from the event loop into the countdown.
    pub fn on_tick(&mut self, elapsed: Duration) -> CountdownSignal {
        if self.phase != Phase::Counting {
            return CountdownSignal::Idle;
        }
        let signal = self.countdown.advance(elapsed);
        self.apply_signal(signal);
        signal
    }

    /// Like [`DrillEngine::on_tick`] for time tagged with the countdown epoch it was
    /// scheduled against; time for an earlier arming is dropped.
    pub fn on_tick_for(&mut self, epoch: u64, elapsed: Duration) -> CountdownSignal {
        if self.phase != Phase::Counting {
            return CountdownSignal::Idle;
        }
        let signal = self.countdown.advance_for(epoch, elapsed);
        self.apply_signal(signal);
        signal
    }

    fn apply_signal(&mut self, signal: CountdownSignal) {
        match signal {
            CountdownSignal::Idle => {}
            CountdownSignal::Tick { remaining } => {
                trace!(remaining, "countdown tick");
                self.remaining_secs = remaining;
            }
            CountdownSignal::Expired => {
                self.expire();
            }
        }
    }

    fn resolve(&mut self, response: Option<usize>, judgment: Judgment, contribution: u32) {
        let point_id = self
            .sequence
            .get(self.current_index)
            .map(|p| p.id.clone())
            .unwrap_or_default();

        self.accumulated += contribution;
        if judgment.is_correct() {
            self.correct += 1;
        }
        self.submitted = response;
        self.outcomes.push(PointOutcome {
            point_id,
            response,
            judgment,
            remaining_secs: self.remaining_secs,
            contribution,
        });
        self.phase = Phase::Resolved;

        debug!(
            index = self.current_index,
            ?judgment,
            contribution,
            accumulated = self.accumulated,
            "decision point resolved"
        );
    }

    /// Move past a resolved point, finishing the run after the last one.
    pub fn advance(&mut self) -> Advance {
        if self.phase != Phase::Resolved {
            return Advance::Ignored;
        }

        if self.current_index + 1 < self.sequence.len() {
            self.current_index += 1;
            self.submitted = None;
            self.remaining_secs = 0;
            self.phase = Phase::NotStarted;
            if self.sequence.pacing() == Pacing::Continuous {
                self.start();
            }
            return Advance::Next {
                index: self.current_index,
            };
        }

        self.countdown.disarm();
        self.current_index = self.sequence.len();
        self.phase = Phase::Complete;

        let total = self.sequence.len();
        let elapsed = self
            .started_at
            .map(|started| self.clock.now().saturating_duration_since(started))
            .unwrap_or_default();
        let completion = Completion {
            final_score: scoring::final_score(
                self.sequence.mode(),
                self.accumulated,
                self.correct,
                total,
            ),
            elapsed,
            correct: self.correct,
            total,
            finished_at: Local::now(),
        };

        info!(
            score = completion.final_score,
            correct = completion.correct,
            total,
            elapsed_secs = completion.elapsed_secs(),
            "drill complete"
        );

        if let Some(listener) = self.listener.as_mut() {
            listener(&completion);
        }
        self.completion = Some(completion.clone());
        Advance::Completed(completion)
    }

    /// Throw the run away and return to the state right after construction.
    pub fn restart(&mut self) {
        self.countdown.disarm();
        self.phase = Phase::NotStarted;
        self.current_index = 0;
        self.remaining_secs = 0;
        self.submitted = None;
        self.accumulated = 0;
        self.correct = 0;
        self.outcomes.clear();
        self.started_at = None;
        self.completion = None;
        debug!("drill restarted");
    }

    pub fn sequence(&self) -> &Arc<Sequence> {
        &self.sequence
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_point(&self) -> Option<&DecisionPoint> {
        self.sequence.get(self.current_index)
    }

    /// Seconds left on the current point; only defined while `Counting`.
    pub fn remaining_secs(&self) -> Option<u32> {
        (self.phase == Phase::Counting).then_some(self.remaining_secs)
    }

    pub fn submitted_response(&self) -> Option<usize> {
        self.submitted
    }

    pub fn accumulated_score(&self) -> u32 {
        self.accumulated
    }

    pub fn correct_count(&self) -> usize {
        self.correct
    }

    pub fn outcomes(&self) -> &[PointOutcome] {
        &self.outcomes
    }

    pub fn last_outcome(&self) -> Option<&PointOutcome> {
        self.outcomes.last()
    }

    /// Feedback text for the point that was just resolved
    pub fn feedback(&self) -> Option<&str> {
        if self.phase != Phase::Resolved {
            return None;
        }
        let outcome = self.outcomes.last()?;
        let point = self.current_point()?;
        Some(point.responses.feedback(outcome.response, outcome.judgment))
    }

    /// Score over the points resolved so far, on the same scale as the final score
    pub fn running_score(&self) -> u8 {
        scoring::final_score(
            self.sequence.mode(),
            self.accumulated,
            self.correct,
            self.outcomes.len(),
        )
    }

    /// Share of points reached, counting the current one
    pub fn progress(&self) -> f64 {
        let total = self.sequence.len();
        ((self.current_index + 1).min(total)) as f64 / total as f64
    }

    pub fn is_last_point(&self) -> bool {
        self.current_index + 1 == self.sequence.len()
    }

    pub fn timer_epoch(&self) -> u64 {
        self.countdown.epoch()
    }

    pub fn completion(&self) -> Option<&Completion> {
        self.completion.as_ref()
    }
}

impl<C: Clock> fmt::Debug for DrillEngine<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrillEngine")
            .field("phase", &self.phase)
            .field("current_index", &self.current_index)
            .field("remaining_secs", &self.remaining_secs)
            .field("submitted", &self.submitted)
            .field("accumulated", &self.accumulated)
            .field("points", &self.sequence.len())
            .finish_non_exhaustive()
    }
}
