use serde::{Deserialize, Serialize};

/// Feedback shown when a point times out without a response
pub const TIMEOUT_FEEDBACK: &str = "Time's up! Remember to act quickly during an emergency.";

/// How responses at a point are judged
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgingMode {
    /// Every choice carries its own correctness flag.
    EnumeratedChoice,
    /// The chosen action label is matched against one expected action.
    FreeAction,
}

/// How a chosen action label is compared to the expected action
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionMatch {
    /// Case-insensitive equality after trimming.
    #[default]
    Exact,
    /// Case-insensitive containment of the expected action in the label.
    Contains,
}

impl ActionMatch {
    pub fn matches(self, label: &str, expected: &str) -> bool {
        let label = label.trim().to_lowercase();
        let expected = expected.trim().to_lowercase();
        match self {
            ActionMatch::Exact => label == expected,
            ActionMatch::Contains => label.contains(&expected),
        }
    }
}

/// Verdict for a single point
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Judgment {
    Correct,
    Incorrect,
    /// The countdown ran out before any response.
    Unanswered,
}

impl Judgment {
    pub fn is_correct(self) -> bool {
        self == Judgment::Correct
    }
}

/// Situation text shown to the learner; the engine never inspects it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Prompt {
    pub title: String,
    pub narrative: String,
    pub situation: Option<String>,
}

impl Prompt {
    pub fn new(title: impl Into<String>, narrative: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            narrative: narrative.into(),
            situation: None,
        }
    }

    pub fn with_situation(mut self, situation: impl Into<String>) -> Self {
        self.situation = Some(situation.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOption {
    pub label: String,
    pub hint: String,
}

/// Capability shared by both response shapes: offer candidates and judge one of them
pub trait Judge {
    fn candidate_count(&self) -> usize;

    fn candidate_label(&self, index: usize) -> Option<&str>;

    /// `None` when `index` is not an offered candidate.
    fn judge(&self, index: usize, matching: ActionMatch) -> Option<Judgment>;

    fn feedback(&self, index: Option<usize>, judgment: Judgment) -> &str;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChoiceSet {
    pub choices: Vec<Choice>,
}

impl Judge for ChoiceSet {
    fn candidate_count(&self) -> usize {
        self.choices.len()
    }

    fn candidate_label(&self, index: usize) -> Option<&str> {
        self.choices.get(index).map(|c| c.text.as_str())
    }

    fn judge(&self, index: usize, _matching: ActionMatch) -> Option<Judgment> {
        self.choices.get(index).map(|c| {
            if c.is_correct {
                Judgment::Correct
            } else {
                Judgment::Incorrect
            }
        })
    }

    fn feedback(&self, index: Option<usize>, judgment: Judgment) -> &str {
        match (judgment, index.and_then(|i| self.choices.get(i))) {
            (Judgment::Unanswered, _) | (_, None) => TIMEOUT_FEEDBACK,
            (_, Some(choice)) => &choice.explanation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSet {
    pub expected: String,
    pub offered: Vec<ActionOption>,
    pub correct_feedback: String,
    pub incorrect_feedback: String,
}

impl Judge for ActionSet {
    fn candidate_count(&self) -> usize {
        self.offered.len()
    }

    fn candidate_label(&self, index: usize) -> Option<&str> {
        self.offered.get(index).map(|a| a.label.as_str())
    }

    fn judge(&self, index: usize, matching: ActionMatch) -> Option<Judgment> {
        self.offered.get(index).map(|a| {
            if matching.matches(&a.label, &self.expected) {
                Judgment::Correct
            } else {
                Judgment::Incorrect
            }
        })
    }

    fn feedback(&self, _index: Option<usize>, judgment: Judgment) -> &str {
        match judgment {
            Judgment::Correct => &self.correct_feedback,
            Judgment::Incorrect => &self.incorrect_feedback,
            Judgment::Unanswered => TIMEOUT_FEEDBACK,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Responses {
    Choices(ChoiceSet),
    Actions(ActionSet),
}

impl Responses {
    pub fn mode(&self) -> JudgingMode {
        match self {
            Responses::Choices(_) => JudgingMode::EnumeratedChoice,
            Responses::Actions(_) => JudgingMode::FreeAction,
        }
    }

    fn as_judge(&self) -> &dyn Judge {
        match self {
            Responses::Choices(set) => set,
            Responses::Actions(set) => set,
        }
    }
}

impl Judge for Responses {
    fn candidate_count(&self) -> usize {
        self.as_judge().candidate_count()
    }

    fn candidate_label(&self, index: usize) -> Option<&str> {
        self.as_judge().candidate_label(index)
    }

    fn judge(&self, index: usize, matching: ActionMatch) -> Option<Judgment> {
        self.as_judge().judge(index, matching)
    }

    fn feedback(&self, index: Option<usize>, judgment: Judgment) -> &str {
        self.as_judge().feedback(index, judgment)
    }
}

/// One timed situation with its candidate responses
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecisionPoint {
    pub id: String,
    pub prompt: Prompt,
    pub time_limit_secs: u32,
    pub responses: Responses,
}

impl DecisionPoint {
    pub fn with_choices(
        id: impl Into<String>,
        prompt: Prompt,
        time_limit_secs: u32,
        choices: Vec<Choice>,
    ) -> Self {
        Self {
            id: id.into(),
            prompt,
            time_limit_secs,
            responses: Responses::Choices(ChoiceSet { choices }),
        }
    }

    pub fn with_actions(
        id: impl Into<String>,
        prompt: Prompt,
        time_limit_secs: u32,
        actions: ActionSet,
    ) -> Self {
        Self {
            id: id.into(),
            prompt,
            time_limit_secs,
            responses: Responses::Actions(actions),
        }
    }

    pub fn mode(&self) -> JudgingMode {
        self.responses.mode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kitchen_actions() -> ActionSet {
        ActionSet {
            expected: "Drop, Cover, Hold".into(),
            offered: vec![
                ActionOption {
                    label: "Drop, Cover, Hold".into(),
                    hint: "Get under a table".into(),
                },
                ActionOption {
                    label: "Run Outside".into(),
                    hint: "Exit the building".into(),
                },
                ActionOption {
                    label: "Drop, Cover, Hold near the stove".into(),
                    hint: String::new(),
                },
            ],
            correct_feedback: "Well done".into(),
            incorrect_feedback: "Not safe".into(),
        }
    }

    #[test]
    fn exact_match_ignores_case_and_padding() {
        assert!(ActionMatch::Exact.matches("  drop, cover, HOLD ", "Drop, Cover, Hold"));
        assert!(!ActionMatch::Exact.matches("Drop, Cover, Hold On", "Drop, Cover, Hold"));
    }

    #[test]
    fn contains_match_accepts_longer_labels() {
        assert!(ActionMatch::Contains.matches("Drop, Cover, Hold On", "drop, cover, hold"));
        assert!(!ActionMatch::Contains.matches("Run Outside", "Drop, Cover, Hold"));
    }

    #[test]
    fn action_set_judging_depends_on_policy() {
        let actions = kitchen_actions();

        assert_eq!(actions.judge(0, ActionMatch::Exact), Some(Judgment::Correct));
        assert_eq!(actions.judge(1, ActionMatch::Exact), Some(Judgment::Incorrect));
        assert_eq!(actions.judge(2, ActionMatch::Exact), Some(Judgment::Incorrect));
        assert_eq!(actions.judge(2, ActionMatch::Contains), Some(Judgment::Correct));
        assert_eq!(actions.judge(9, ActionMatch::Exact), None);
    }

    #[test]
    fn action_feedback_follows_judgment() {
        let actions = kitchen_actions();
        assert_eq!(actions.feedback(Some(0), Judgment::Correct), "Well done");
        assert_eq!(actions.feedback(Some(1), Judgment::Incorrect), "Not safe");
        assert_eq!(actions.feedback(None, Judgment::Unanswered), TIMEOUT_FEEDBACK);
    }

    #[test]
    fn choice_set_uses_flags_and_explanations() {
        let set = ChoiceSet {
            choices: vec![
                Choice {
                    id: "drop".into(),
                    text: "Drop under the desk".into(),
                    is_correct: true,
                    explanation: "Protects you".into(),
                },
                Choice {
                    id: "window".into(),
                    text: "Move to the window".into(),
                    is_correct: false,
                    explanation: "Glass shatters".into(),
                },
            ],
        };

        assert_eq!(set.candidate_count(), 2);
        assert_eq!(set.candidate_label(1), Some("Move to the window"));
        assert_eq!(set.judge(0, ActionMatch::Exact), Some(Judgment::Correct));
        assert_eq!(set.judge(1, ActionMatch::Contains), Some(Judgment::Incorrect));
        assert_eq!(set.feedback(Some(1), Judgment::Incorrect), "Glass shatters");
        assert_eq!(set.feedback(None, Judgment::Unanswered), TIMEOUT_FEEDBACK);
    }

    #[test]
    fn responses_report_their_mode() {
        let point = DecisionPoint::with_actions("p", Prompt::new("t", "n"), 10, kitchen_actions());
        assert_eq!(point.mode(), JudgingMode::FreeAction);
        assert_eq!(point.responses.candidate_count(), 3);
    }
}
