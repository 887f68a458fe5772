use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::grading::{
    AnswerValidation, GradingError, GradingService, QuizQuestion, SubmissionResult,
};

/// Identifies one request to the grading collaborator. A response is only applied
/// when it carries the ticket of the request still awaited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pending {
    Validation { ticket: Ticket, question: usize },
    Submission { ticket: Ticket },
}

impl Pending {
    fn ticket(self) -> Ticket {
        match self {
            Pending::Validation { ticket, .. } | Pending::Submission { ticket } => ticket,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuizStep {
    Ignored,
    Next { index: usize },
    /// The last question has been checked; submit the sheet.
    ReadyToSubmit,
}

/// Walks the learner through a fetched quiz, delegating every judgment to a
/// [`GradingService`]
#[derive(Debug)]
pub struct QuizSession {
    module_id: String,
    questions: Vec<QuizQuestion>,
    current: usize,
    answers: Vec<Option<usize>>,
    validation: Option<AnswerValidation>,
    pending: Option<Pending>,
    next_ticket: u64,
    result: Option<SubmissionResult>,
    last_error: Option<GradingError>,
    torn_down: bool,
}

impl QuizSession {
    pub fn new(module_id: impl Into<String>, mut questions: Vec<QuizQuestion>) -> Self {
        questions.sort_by_key(|q| q.order_index);
        let answers = vec![None; questions.len()];
        Self {
            module_id: module_id.into(),
            questions,
            current: 0,
            answers,
            validation: None,
            pending: None,
            next_ticket: 0,
            result: None,
            last_error: None,
            torn_down: false,
        }
    }

    pub fn load<S: GradingService + ?Sized>(
        service: &S,
        module_id: &str,
    ) -> Result<Self, GradingError> {
        let questions = service.fetch_questions(module_id)?;
        debug!(module = module_id, count = questions.len(), "quiz loaded");
        Ok(Self::new(module_id, questions))
    }

    fn accepting_input(&self) -> bool {
        !self.torn_down && self.result.is_none() && self.pending.is_none()
    }

    fn issue(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// Pick an option for the current question. Locked once the answer is checked.
    pub fn select(&mut self, answer: usize) -> bool {
        if !self.accepting_input() || self.validation.is_some() {
            return false;
        }
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };
        if answer >= question.options.len() {
            return false;
        }
        self.answers[self.current] = Some(answer);
        true
    }

    pub fn request_validation(&mut self) -> Option<(Ticket, String, usize)> {
        if !self.accepting_input() || self.validation.is_some() {
            return None;
        }
        let answer = self.answers.get(self.current).copied().flatten()?;
        let question_id = self.questions.get(self.current)?.id.clone();
        let ticket = self.issue();
        self.pending = Some(Pending::Validation {
            ticket,
            question: self.current,
        });
        Some((ticket, question_id, answer))
    }

    /// Apply a validation response; returns false when it was discarded as stale.
    pub fn apply_validation(
        &mut self,
        ticket: Ticket,
        response: Result<AnswerValidation, GradingError>,
    ) -> bool {
        match self.pending {
            Some(Pending::Validation {
                ticket: awaited,
                question,
            }) if !self.torn_down && awaited == ticket && question == self.current => {}
            _ => {
                debug!(?ticket, "discarding stale validation response");
                return false;
            }
        }
        self.pending = None;
        match response {
            Ok(validation) => {
                self.last_error = None;
                self.validation = Some(validation);
            }
            Err(err) => {
                warn!(error = %err, "answer validation failed");
                self.last_error = Some(err);
            }
        }
        true
    }

    pub fn validate_with<S: GradingService + ?Sized>(&mut self, service: &S) -> bool {
        let Some((ticket, question_id, answer)) = self.request_validation() else {
            return false;
        };
        let response = service.validate_answer(&question_id, answer);
        self.apply_validation(ticket, response)
    }

    /// Move past a checked question.
    pub fn next(&mut self) -> QuizStep {
        if !self.accepting_input() || self.validation.is_none() {
            return QuizStep::Ignored;
        }
        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.validation = None;
            QuizStep::Next {
                index: self.current,
            }
        } else {
            QuizStep::ReadyToSubmit
        }
    }

    /// Answers keyed by question order index; unanswered questions are left out.
    pub fn answer_sheet(&self) -> BTreeMap<usize, usize> {
        self.questions
            .iter()
            .zip(&self.answers)
            .filter_map(|(q, a)| (*a).map(|a| (q.order_index, a)))
            .collect()
    }

    pub fn request_submission(&mut self) -> Option<(Ticket, BTreeMap<usize, usize>)> {
        if !self.accepting_input() || self.questions.is_empty() {
            return None;
        }
        let on_last_checked = self.current + 1 == self.questions.len() && self.validation.is_some();
        if !on_last_checked {
            return None;
        }
        let ticket = self.issue();
        self.pending = Some(Pending::Submission { ticket });
        Some((ticket, self.answer_sheet()))
    }

    /// Apply the final score; returns false when it was discarded as stale.
    pub fn apply_submission(
        &mut self,
        ticket: Ticket,
        response: Result<SubmissionResult, GradingError>,
    ) -> bool {
        if self.torn_down || self.pending.map(Pending::ticket) != Some(ticket) {
            debug!(?ticket, "discarding stale submission response");
            return false;
        }
        self.pending = None;
        match response {
            Ok(result) => {
                info!(
                    module = %self.module_id,
                    score = result.score,
                    passed = result.passed,
                    "quiz submitted"
                );
                self.last_error = None;
                self.result = Some(result);
            }
            Err(err) => {
                warn!(error = %err, "quiz submission failed");
                self.last_error = Some(err);
            }
        }
        true
    }

    pub fn submit_with<S: GradingService + ?Sized>(&mut self, service: &S) -> bool {
        let Some((ticket, answers)) = self.request_submission() else {
            return false;
        };
        let response = service.submit_answers(&self.module_id, &answers);
        self.apply_submission(ticket, response)
    }

    /// Start over with the same questions. Outstanding requests become stale.
    pub fn restart(&mut self) {
        self.current = 0;
        self.answers = vec![None; self.questions.len()];
        self.validation = None;
        self.pending = None;
        self.result = None;
        self.last_error = None;
    }

    /// The screen is going away; every later response is dropped.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.pending = None;
    }

    pub fn module_id(&self) -> &str {
        &self.module_id
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        self.questions.get(self.current)
    }

    pub fn selected(&self) -> Option<usize> {
        self.answers.get(self.current).copied().flatten()
    }

    pub fn validation(&self) -> Option<&AnswerValidation> {
        self.validation.as_ref()
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&GradingError> {
        self.last_error.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn progress(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.questions.len() as f64
    }
}
