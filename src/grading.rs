//! Boundary to the quiz grading collaborator.
//!
//! The quiz screen never sees answer keys: it fetches questions, asks the collaborator
//! to check a single answer, and submits the whole answer sheet for the final score.
//! [`InMemoryGrader`] fulfils the contract locally from module content.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::content::{Module, ModuleCatalog, QuizItem};

/// A question as presented to the learner, without its answer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub options: Vec<String>,
    pub order_index: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerValidation {
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub score: u8,
    pub correct_answers: usize,
    pub total_questions: usize,
    pub passed: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GradingError {
    #[error("no quiz for module '{0}'")]
    UnknownModule(String),

    #[error("no quiz question with id '{0}'")]
    UnknownQuestion(String),

    #[error("answer {answer} is not an option of question '{question_id}'")]
    AnswerOutOfRange { question_id: String, answer: usize },

    #[error("grading service unavailable: {0}")]
    Unavailable(String),
}

/// Remote calls the quiz depends on
pub trait GradingService {
    /// Questions for a module, in presentation order.
    fn fetch_questions(&self, module_id: &str) -> Result<Vec<QuizQuestion>, GradingError>;

    fn validate_answer(
        &self,
        question_id: &str,
        answer: usize,
    ) -> Result<AnswerValidation, GradingError>;

    /// `answers` maps a question's order index to the chosen option. Unanswered
    /// questions are absent and count as wrong.
    fn submit_answers(
        &self,
        module_id: &str,
        answers: &BTreeMap<usize, usize>,
    ) -> Result<SubmissionResult, GradingError>;
}

#[derive(Clone, Debug)]
struct GradedQuiz {
    pass_mark: u8,
    items: Vec<QuizItem>,
}

/// Grades against answer keys held in memory
#[derive(Clone, Debug, Default)]
pub struct InMemoryGrader {
    quizzes: HashMap<String, GradedQuiz>,
}

impl InMemoryGrader {
    pub fn from_catalog(catalog: &ModuleCatalog) -> Self {
        catalog
            .modules()
            .iter()
            .fold(Self::default(), |grader, module| grader.with_module(module))
    }

    pub fn with_module(mut self, module: &Module) -> Self {
        self.quizzes.insert(
            module.id.clone(),
            GradedQuiz {
                pass_mark: module.quiz.pass_mark,
                items: module.quiz.questions.clone(),
            },
        );
        self
    }

    fn find_item(&self, question_id: &str) -> Option<&QuizItem> {
        self.quizzes
            .values()
            .flat_map(|quiz| quiz.items.iter())
            .find(|item| item.id == question_id)
    }
}

impl GradingService for InMemoryGrader {
    fn fetch_questions(&self, module_id: &str) -> Result<Vec<QuizQuestion>, GradingError> {
        let quiz = self
            .quizzes
            .get(module_id)
            .ok_or_else(|| GradingError::UnknownModule(module_id.to_string()))?;

        Ok(quiz
            .items
            .iter()
            .enumerate()
            .map(|(order_index, item)| QuizQuestion {
                id: item.id.clone(),
                question: item.question.clone(),
                options: item.options.clone(),
                order_index,
            })
            .collect())
    }

    fn validate_answer(
        &self,
        question_id: &str,
        answer: usize,
    ) -> Result<AnswerValidation, GradingError> {
        let item = self
            .find_item(question_id)
            .ok_or_else(|| GradingError::UnknownQuestion(question_id.to_string()))?;
        if answer >= item.options.len() {
            return Err(GradingError::AnswerOutOfRange {
                question_id: question_id.to_string(),
                answer,
            });
        }

        Ok(AnswerValidation {
            is_correct: answer == item.correct_index,
            explanation: item.explanation.clone(),
        })
    }

    fn submit_answers(
        &self,
        module_id: &str,
        answers: &BTreeMap<usize, usize>,
    ) -> Result<SubmissionResult, GradingError> {
        let quiz = self
            .quizzes
            .get(module_id)
            .ok_or_else(|| GradingError::UnknownModule(module_id.to_string()))?;

        let total_questions = quiz.items.len();
        let correct_answers = quiz
            .items
            .iter()
            .enumerate()
            .filter(|(idx, item)| answers.get(idx) == Some(&item.correct_index))
            .count();
        let score = if total_questions == 0 {
            0
        } else {
            (correct_answers as f64 / total_questions as f64 * 100.0).round() as u8
        };

        Ok(SubmissionResult {
            score,
            correct_answers,
            total_questions,
            passed: score >= quiz.pass_mark,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grader() -> InMemoryGrader {
        InMemoryGrader::from_catalog(&ModuleCatalog::builtin().unwrap())
    }

    #[test]
    fn fetch_hides_answer_key_and_orders_questions() {
        let questions = grader().fetch_questions("earthquake").unwrap();
        assert_eq!(questions.len(), 5);
        for (i, q) in questions.iter().enumerate() {
            assert_eq!(q.order_index, i);
        }
        let json = serde_json::to_string(&questions[0]).unwrap();
        assert!(!json.contains("correct_index"));
    }

    #[test]
    fn unknown_module_is_an_error() {
        assert_eq!(
            grader().fetch_questions("flood"),
            Err(GradingError::UnknownModule("flood".into()))
        );
    }

    #[test]
    fn validate_reports_correctness() {
        let g = grader();
        assert!(g.validate_answer("eq-q1", 1).unwrap().is_correct);
        assert!(!g.validate_answer("eq-q1", 0).unwrap().is_correct);
        assert_eq!(
            g.validate_answer("eq-q1", 9),
            Err(GradingError::AnswerOutOfRange {
                question_id: "eq-q1".into(),
                answer: 9
            })
        );
        assert!(matches!(
            g.validate_answer("nope", 0),
            Err(GradingError::UnknownQuestion(_))
        ));
    }

    #[test]
    fn submission_scores_and_applies_pass_mark() {
        let g = grader();
        let all_right: BTreeMap<usize, usize> =
            [(0, 1), (1, 2), (2, 0), (3, 1), (4, 1)].into_iter().collect();
        let result = g.submit_answers("earthquake", &all_right).unwrap();
        assert_eq!(result.score, 100);
        assert!(result.passed);

        let partial: BTreeMap<usize, usize> = [(0, 1), (1, 2), (2, 0)].into_iter().collect();
        let result = g.submit_answers("earthquake", &partial).unwrap();
        assert_eq!(result.correct_answers, 3);
        assert_eq!(result.total_questions, 5);
        assert_eq!(result.score, 60);
        assert!(!result.passed);
    }
}
