// Library surface for the binary, headless integration tests and reuse.
pub mod app_dirs;
pub mod celebration;
pub mod clock;
pub mod config;
pub mod content;
pub mod drill;
pub mod grading;
pub mod logging;
pub mod progress;
pub mod quiz;
pub mod rewards;
pub mod runtime;
pub mod timer;

use serde::{Deserialize, Serialize};

pub use runtime::TICK_RATE_MS;

/// The three activities of a training module
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Activity {
    /// Multiple-choice scenarios, each introduced by a briefing
    Scenarios,
    /// Timed virtual drill with free actions
    Drill,
    /// Untimed knowledge check graded by the grading service
    Quiz,
}
