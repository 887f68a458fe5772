use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::point::{ActionMatch, DecisionPoint, Judge, JudgingMode};

/// Rejected sequence configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a drill sequence needs at least one decision point")]
    Empty,

    #[error("decision point '{id}' must have a positive time limit")]
    NonPositiveTimeLimit { id: String },

    #[error("decision point '{id}' offers no responses")]
    NoResponses { id: String },

    #[error("decision point '{id}' is judged as {found:?} but the sequence uses {expected:?}")]
    MixedModes {
        id: String,
        expected: JudgingMode,
        found: JudgingMode,
    },

    #[error("decision point id '{id}' is used more than once")]
    DuplicateId { id: String },
}

/// What happens after feedback on a point that is not the last one
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Advancing arms the next point right away.
    #[default]
    Continuous,
    /// Advancing shows a briefing for the next point; `start` arms it.
    Briefed,
}

/// Immutable, validated list of decision points for one run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    mode: JudgingMode,
    pacing: Pacing,
    action_match: ActionMatch,
    points: Vec<DecisionPoint>,
}

impl Sequence {
    pub fn new(mode: JudgingMode, points: Vec<DecisionPoint>) -> Result<Self, SequenceError> {
        if points.is_empty() {
            return Err(SequenceError::Empty);
        }

        let mut seen = HashSet::new();
        for point in &points {
            if point.time_limit_secs == 0 {
                return Err(SequenceError::NonPositiveTimeLimit {
                    id: point.id.clone(),
                });
            }
            if point.responses.candidate_count() == 0 {
                return Err(SequenceError::NoResponses {
                    id: point.id.clone(),
                });
            }
            if point.mode() != mode {
                return Err(SequenceError::MixedModes {
                    id: point.id.clone(),
                    expected: mode,
                    found: point.mode(),
                });
            }
            if !seen.insert(point.id.as_str()) {
                return Err(SequenceError::DuplicateId {
                    id: point.id.clone(),
                });
            }
        }

        Ok(Self {
            mode,
            pacing: Pacing::default(),
            action_match: ActionMatch::default(),
            points,
        })
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_action_match(mut self, action_match: ActionMatch) -> Self {
        self.action_match = action_match;
        self
    }

    pub fn mode(&self) -> JudgingMode {
        self.mode
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    pub fn action_match(&self) -> ActionMatch {
        self.action_match
    }

    pub fn points(&self) -> &[DecisionPoint] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<&DecisionPoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed sequence; kept for the `len` convention.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::point::{ActionOption, ActionSet, Choice, Prompt};
    use assert_matches::assert_matches;

    fn action_point(id: &str, limit: u32) -> DecisionPoint {
        DecisionPoint::with_actions(
            id,
            Prompt::new(id, "shaking starts"),
            limit,
            ActionSet {
                expected: "Drop, Cover, Hold".into(),
                offered: vec![ActionOption {
                    label: "Drop, Cover, Hold".into(),
                    hint: String::new(),
                }],
                correct_feedback: String::new(),
                incorrect_feedback: String::new(),
            },
        )
    }

    fn choice_point(id: &str, choices: Vec<Choice>) -> DecisionPoint {
        DecisionPoint::with_choices(id, Prompt::new(id, "shaking starts"), 10, choices)
    }

    #[test]
    fn empty_sequence_is_rejected() {
        assert_eq!(
            Sequence::new(JudgingMode::FreeAction, vec![]),
            Err(SequenceError::Empty)
        );
    }

    #[test]
    fn zero_time_limit_is_rejected() {
        let err = Sequence::new(
            JudgingMode::FreeAction,
            vec![action_point("a", 5), action_point("b", 0)],
        )
        .unwrap_err();
        assert_matches!(err, SequenceError::NonPositiveTimeLimit { id } if id == "b");
    }

    #[test]
    fn point_without_responses_is_rejected() {
        let err = Sequence::new(JudgingMode::EnumeratedChoice, vec![choice_point("x", vec![])])
            .unwrap_err();
        assert_matches!(err, SequenceError::NoResponses { .. });
    }

    #[test]
    fn mixed_modes_are_rejected() {
        let choice = Choice {
            id: "c".into(),
            text: "Drop".into(),
            is_correct: true,
            explanation: String::new(),
        };
        let err = Sequence::new(
            JudgingMode::FreeAction,
            vec![action_point("a", 5), choice_point("b", vec![choice])],
        )
        .unwrap_err();
        assert_matches!(
            err,
            SequenceError::MixedModes {
                expected: JudgingMode::FreeAction,
                found: JudgingMode::EnumeratedChoice,
                ..
            }
        );
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Sequence::new(
            JudgingMode::FreeAction,
            vec![action_point("a", 5), action_point("a", 6)],
        )
        .unwrap_err();
        assert_eq!(err, SequenceError::DuplicateId { id: "a".into() });
    }

    #[test]
    fn builder_sets_pacing_and_matching() {
        let seq = Sequence::new(JudgingMode::FreeAction, vec![action_point("a", 5)])
            .unwrap()
            .with_pacing(Pacing::Briefed)
            .with_action_match(ActionMatch::Contains);

        assert_eq!(seq.len(), 1);
        assert_eq!(seq.pacing(), Pacing::Briefed);
        assert_eq!(seq.action_match(), ActionMatch::Contains);
        assert_eq!(seq.get(0).map(|p| p.id.as_str()), Some("a"));
        assert!(seq.get(1).is_none());
    }
}
