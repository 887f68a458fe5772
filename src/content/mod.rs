//! Training module content: built-in modules are embedded JSON, custom ones are read
//! from disk in the same format.

use include_dir::{include_dir, Dir};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::drill::{
    ActionMatch, ActionOption, ActionSet, Choice, DecisionPoint, JudgingMode, Pacing, Prompt,
    Sequence, SequenceError,
};

static CONTENT_DIR: Dir = include_dir!("src/content");

pub const DEFAULT_PASS_MARK: u8 = 80;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("no training module with id '{0}'")]
    NotFound(String),

    #[error("module file {0} is not valid UTF-8")]
    NotUtf8(String),

    #[error("failed to read module file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed module json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid module content: {0}")]
    Invalid(#[from] SequenceError),
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ScenarioOption {
    pub id: String,
    pub text: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Scenario {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub situation: Option<String>,
    pub time_limit: i64,
    pub options: Vec<ScenarioOption>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ScenarioSet {
    pub title: String,
    pub description: String,
    pub points: Vec<Scenario>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DrillAction {
    pub label: String,
    #[serde(default)]
    pub hint: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DrillStep {
    pub id: String,
    pub title: String,
    pub description: String,
    pub action: String,
    pub time_limit: i64,
    pub correct_feedback: String,
    pub incorrect_feedback: String,
    /// Overrides the drill-wide action list for this step.
    #[serde(default)]
    pub actions: Option<Vec<DrillAction>>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DrillSpec {
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub actions: Vec<DrillAction>,
    pub steps: Vec<DrillStep>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct QuizItem {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct QuizSpec {
    pub title: String,
    pub description: String,
    #[serde(default = "default_pass_mark")]
    pub pass_mark: u8,
    pub questions: Vec<QuizItem>,
}

fn default_pass_mark() -> u8 {
    DEFAULT_PASS_MARK
}

/// One training module: scenarios, a virtual drill and a quiz
#[derive(Deserialize, Clone, Debug)]
pub struct Module {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub estimated_time: String,
    pub scenarios: ScenarioSet,
    pub drill: DrillSpec,
    pub quiz: QuizSpec,
}

fn time_limit(raw: i64) -> u32 {
    // Non-positive limits map to 0 and are rejected by `Sequence::new`.
    u32::try_from(raw).unwrap_or(if raw > 0 { u32::MAX } else { 0 })
}

impl Module {
    pub fn from_json(json: &str) -> Result<Self, ContentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ContentError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Enumerated-choice scenarios, each introduced by a briefing.
    pub fn scenario_sequence(&self) -> Result<Sequence, SequenceError> {
        let points = self
            .scenarios
            .points
            .iter()
            .map(|s| {
                let mut prompt = Prompt::new(&s.title, &s.description);
                if let Some(situation) = &s.situation {
                    prompt = prompt.with_situation(situation);
                }
                let choices = s
                    .options
                    .iter()
                    .map(|o| Choice {
                        id: o.id.clone(),
                        text: o.text.clone(),
                        is_correct: o.is_correct,
                        explanation: o.explanation.clone(),
                    })
                    .collect();
                DecisionPoint::with_choices(&s.id, prompt, time_limit(s.time_limit), choices)
            })
            .collect();

        Ok(Sequence::new(JudgingMode::EnumeratedChoice, points)?.with_pacing(Pacing::Briefed))
    }

    /// Free-action drill steps that run back to back.
    pub fn drill_sequence(&self, action_match: ActionMatch) -> Result<Sequence, SequenceError> {
        let points = self
            .drill
            .steps
            .iter()
            .map(|step| {
                let offered = step
                    .actions
                    .as_ref()
                    .unwrap_or(&self.drill.actions)
                    .iter()
                    .map(|a| ActionOption {
                        label: a.label.clone(),
                        hint: a.hint.clone(),
                    })
                    .collect();
                DecisionPoint::with_actions(
                    &step.id,
                    Prompt::new(&step.title, &step.description),
                    time_limit(step.time_limit),
                    ActionSet {
                        expected: step.action.clone(),
                        offered,
                        correct_feedback: step.correct_feedback.clone(),
                        incorrect_feedback: step.incorrect_feedback.clone(),
                    },
                )
            })
            .collect();

        Ok(Sequence::new(JudgingMode::FreeAction, points)?
            .with_pacing(Pacing::Continuous)
            .with_action_match(action_match))
    }
}

/// All modules available to the application
#[derive(Clone, Debug, Default)]
pub struct ModuleCatalog {
    modules: Vec<Module>,
}

impl ModuleCatalog {
    /// Modules shipped inside the binary
    pub fn builtin() -> Result<Self, ContentError> {
        let mut modules = CONTENT_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "json"))
            .map(|f| {
                let json = f
                    .contents_utf8()
                    .ok_or_else(|| ContentError::NotUtf8(f.path().display().to_string()))?;
                Module::from_json(json)
            })
            .collect::<Result<Vec<_>, _>>()?;
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(Self { modules })
    }

    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.retain(|m| m.id != module.id);
        self.modules.push(module);
        self
    }

    pub fn get(&self, id: &str) -> Result<&Module, ContentError> {
        self.modules
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ContentError::NotFound(id.to_string()))
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drill::{Judge, Judgment};
    use assert_matches::assert_matches;

    fn earthquake() -> Module {
        ModuleCatalog::builtin()
            .unwrap()
            .get("earthquake")
            .unwrap()
            .clone()
    }

    #[test]
    fn builtin_catalog_contains_earthquake() {
        let catalog = ModuleCatalog::builtin().unwrap();
        let module = catalog.get("earthquake").unwrap();

        assert_eq!(module.title, "Earthquake Safety");
        assert_eq!(module.scenarios.points.len(), 3);
        assert_eq!(module.drill.steps.len(), 3);
        assert!(!module.quiz.questions.is_empty());
        assert_eq!(module.quiz.pass_mark, 80);
    }

    #[test]
    fn unknown_module_is_not_found() {
        let catalog = ModuleCatalog::builtin().unwrap();
        assert_matches!(catalog.get("tsunami"), Err(ContentError::NotFound(id)) if id == "tsunami");
    }

    #[test]
    fn scenario_sequence_is_briefed_with_choice_limits() {
        let seq = earthquake().scenario_sequence().unwrap();

        assert_eq!(seq.mode(), JudgingMode::EnumeratedChoice);
        assert_eq!(seq.pacing(), Pacing::Briefed);
        let limits: Vec<u32> = seq.points().iter().map(|p| p.time_limit_secs).collect();
        assert_eq!(limits, vec![15, 12, 10]);
    }

    #[test]
    fn drill_steps_offer_their_expected_action() {
        let seq = earthquake().drill_sequence(ActionMatch::Exact).unwrap();

        assert_eq!(seq.mode(), JudgingMode::FreeAction);
        for point in seq.points() {
            let correct = (0..point.responses.candidate_count())
                .filter(|&i| {
                    point.responses.judge(i, seq.action_match()) == Some(Judgment::Correct)
                })
                .count();
            assert_eq!(correct, 1, "step {} needs exactly one correct action", point.id);
        }
    }

    #[test]
    fn negative_time_limit_fails_fast() {
        let mut module = earthquake();
        module.drill.steps[1].time_limit = -4;

        assert_matches!(
            module.drill_sequence(ActionMatch::Exact),
            Err(SequenceError::NonPositiveTimeLimit { id }) if id == "home-kitchen"
        );
    }

    #[test]
    fn custom_module_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let builtin = CONTENT_DIR
            .get_file("earthquake.json")
            .and_then(|f| f.contents_utf8())
            .unwrap();
        let mut json: serde_json::Value = serde_json::from_str(builtin).unwrap();
        json["title"] = serde_json::Value::from("Earthquake Safety (Office Edition)");
        std::fs::write(&path, serde_json::to_string(&json).unwrap()).unwrap();

        let module = Module::from_path(&path).unwrap();
        let catalog = ModuleCatalog::builtin().unwrap().with_module(module);

        assert_eq!(catalog.modules().len(), 1);
        assert_eq!(
            catalog.get("earthquake").unwrap().title,
            "Earthquake Safety (Office Edition)"
        );
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert_matches!(Module::from_json("{ not json"), Err(ContentError::Parse(_)));
    }
}
