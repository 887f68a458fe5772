use tracing::debug;

use crate::Activity;

/// How the learner has done so far in this process. Nothing is written to disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub quiz_score: Option<u8>,
    pub scenario_score: Option<u8>,
    pub drill_score: Option<u8>,
    pub drills_completed: u32,
}

impl SessionProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest score wins; every finished drill counts.
    pub fn record(&mut self, activity: Activity, score: u8) {
        match activity {
            Activity::Quiz => self.quiz_score = Some(score),
            Activity::Scenarios => self.scenario_score = Some(score),
            Activity::Drill => {
                self.drill_score = Some(score);
                self.drills_completed += 1;
            }
        }
        debug!(%activity, score, drills = self.drills_completed, "progress updated");
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Mean of the scores recorded so far.
    pub fn overall(&self) -> Option<u8> {
        let scores: Vec<u32> = [self.quiz_score, self.scenario_score, self.drill_score]
            .into_iter()
            .flatten()
            .map(u32::from)
            .collect();
        if scores.is_empty() {
            return None;
        }
        let mean = f64::from(scores.iter().sum::<u32>()) / scores.len() as f64;
        Some(mean.round() as u8)
    }
}
