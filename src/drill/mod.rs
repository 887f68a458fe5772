//! Timed decision engine shared by the scenario and virtual drill activities.
//!
//! A [`Sequence`] of [`DecisionPoint`]s is walked by a [`DrillEngine`]: each point is
//! armed with a countdown, resolved by a submission or by expiry, and the run finishes
//! with a single [`Completion`] report.

pub mod engine;
pub mod point;
pub mod scoring;
pub mod sequence;

pub use engine::{Advance, Completion, DrillEngine, Phase, PointOutcome};
pub use point::{
    ActionMatch, ActionOption, ActionSet, Choice, ChoiceSet, DecisionPoint, Judge, JudgingMode,
    Judgment, Prompt, Responses,
};
pub use sequence::{Pacing, Sequence, SequenceError};
