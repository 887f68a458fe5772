use std::cell::Cell;
use std::collections::BTreeMap;

use prepdrill::content::ModuleCatalog;
use prepdrill::grading::{
    AnswerValidation, GradingError, GradingService, InMemoryGrader, QuizQuestion,
    SubmissionResult,
};
use prepdrill::quiz::{QuizSession, QuizStep};
use prepdrill::rewards::BadgeBook;
use prepdrill::Activity;

fn grader() -> InMemoryGrader {
    InMemoryGrader::from_catalog(&ModuleCatalog::builtin().unwrap())
}

/// Grades like the in-memory grader but can be switched offline
struct FlakyGrader {
    inner: InMemoryGrader,
    online: Cell<bool>,
}

impl FlakyGrader {
    fn check(&self) -> Result<(), GradingError> {
        if self.online.get() {
            Ok(())
        } else {
            Err(GradingError::Unavailable("connection refused".into()))
        }
    }
}

impl GradingService for FlakyGrader {
    fn fetch_questions(&self, module_id: &str) -> Result<Vec<QuizQuestion>, GradingError> {
        self.check()?;
        self.inner.fetch_questions(module_id)
    }

    fn validate_answer(
        &self,
        question_id: &str,
        answer: usize,
    ) -> Result<AnswerValidation, GradingError> {
        self.check()?;
        self.inner.validate_answer(question_id, answer)
    }

    fn submit_answers(
        &self,
        module_id: &str,
        answers: &BTreeMap<usize, usize>,
    ) -> Result<SubmissionResult, GradingError> {
        self.check()?;
        self.inner.submit_answers(module_id, answers)
    }
}

fn answer_all(quiz: &mut QuizSession, service: &dyn GradingService, picks: &[usize]) {
    for pick in picks {
        assert!(quiz.select(*pick));
        assert!(quiz.validate_with(service));
        if let QuizStep::ReadyToSubmit = quiz.next() {
            break;
        }
    }
}

#[test]
fn passing_quiz_earns_quiz_ace_once() {
    let grader = grader();
    let mut quiz = QuizSession::load(&grader, "earthquake").unwrap();
    answer_all(&mut quiz, &grader, &[1, 2, 0, 1, 1]);
    assert!(quiz.submit_with(&grader));

    let score = quiz.result().unwrap().score;
    assert_eq!(score, 100);

    let mut book = BadgeBook::new();
    assert_eq!(book.record(Activity::Quiz, score).map(|b| b.id), Some("quiz-ace"));
    assert!(book.record(Activity::Quiz, score).is_none());
}

#[test]
fn failing_quiz_earns_nothing() {
    let grader = grader();
    let mut quiz = QuizSession::load(&grader, "earthquake").unwrap();
    answer_all(&mut quiz, &grader, &[0, 0, 0, 0, 0]);
    assert!(quiz.submit_with(&grader));

    let result = quiz.result().unwrap();
    assert_eq!(result.correct_answers, 1);
    assert_eq!(result.score, 20);
    assert!(!result.passed);
    assert!(BadgeBook::new().record(Activity::Quiz, result.score).is_none());
}

#[test]
fn offline_submission_can_be_retried() {
    let flaky = FlakyGrader {
        inner: grader(),
        online: Cell::new(true),
    };
    let mut quiz = QuizSession::load(&flaky, "earthquake").unwrap();
    answer_all(&mut quiz, &flaky, &[1, 2, 0, 1, 1]);

    flaky.online.set(false);
    assert!(quiz.submit_with(&flaky));
    assert!(quiz.result().is_none());
    assert!(matches!(quiz.last_error(), Some(GradingError::Unavailable(_))));

    flaky.online.set(true);
    assert!(quiz.submit_with(&flaky));
    assert_eq!(quiz.result().unwrap().score, 100);
    assert!(quiz.last_error().is_none());
}

#[test]
fn offline_fetch_fails_to_load() {
    let flaky = FlakyGrader {
        inner: grader(),
        online: Cell::new(false),
    };
    assert!(matches!(
        QuizSession::load(&flaky, "earthquake"),
        Err(GradingError::Unavailable(_))
    ));
}

#[test]
fn late_submission_after_teardown_is_dropped() {
    let grader = grader();
    let mut quiz = QuizSession::load(&grader, "earthquake").unwrap();
    answer_all(&mut quiz, &grader, &[1, 2, 0, 1, 1]);

    let (ticket, sheet) = quiz.request_submission().unwrap();
    assert_eq!(sheet.len(), 5);
    assert!(quiz.is_pending());
    quiz.teardown();

    let late = grader.submit_answers("earthquake", &sheet);
    assert!(!quiz.apply_submission(ticket, late));
    assert!(quiz.result().is_none());
}
