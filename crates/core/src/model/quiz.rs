use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{QuestionId, QuizId};
use crate::model::question::{Question, QuestionError};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("no questions available")]
    NoQuestions,

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {question_id} is not playable")]
    InvalidQuestion {
        question_id: QuestionId,
        source: QuestionError,
    },

    #[error("availability window ends before it starts")]
    InvalidWindow,
}

//
// ─── AVAILABILITY ──────────────────────────────────────────────────────────────
//

/// Where `now` falls relative to a quiz's availability window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizAvailability {
    Upcoming,
    Open,
    Ended,
}

/// Optional start/end bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailabilityWindow {
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    /// # Errors
    ///
    /// Returns `QuizError::InvalidWindow` if both bounds are set and `ends_at < starts_at`.
    pub fn new(
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) -> Result<Self, QuizError> {
        if let (Some(start), Some(end)) = (starts_at, ends_at) {
            if end < start {
                return Err(QuizError::InvalidWindow);
            }
        }
        Ok(Self { starts_at, ends_at })
    }

    #[must_use]
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at
    }

    #[must_use]
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    #[must_use]
    pub fn availability(&self, now: DateTime<Utc>) -> QuizAvailability {
        if self.starts_at.is_some_and(|start| now < start) {
            QuizAvailability::Upcoming
        } else if self.ends_at.is_some_and(|end| now > end) {
            QuizAvailability::Ended
        } else {
            QuizAvailability::Open
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// Quiz content loaded for one session.
///
/// Always holds at least one question, and question ids are unique. Question
/// order is fixed for the lifetime of the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quiz {
    id: QuizId,
    title: String,
    description: Option<String>,
    questions: Vec<Question>,
    time_per_question: u32,
    window: AvailabilityWindow,
}

impl Quiz {
    /// Creates a quiz. `time_per_question` is in seconds; `0` means untimed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty question list and
    /// `QuizError::DuplicateQuestion` if two questions share an id.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        questions: Vec<Question>,
        time_per_question: u32,
    ) -> Result<Self, QuizError> {
        if questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for question in &questions {
            if !seen.insert(question.id()) {
                return Err(QuizError::DuplicateQuestion(question.id().clone()));
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            description: None,
            questions,
            time_per_question,
            window: AvailabilityWindow::default(),
        })
    }

    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_window(mut self, window: AvailabilityWindow) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Number of questions. Never zero.
    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    #[must_use]
    pub fn find_question(&self, id: &QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    #[must_use]
    pub fn time_per_question(&self) -> u32 {
        self.time_per_question
    }

    #[must_use]
    pub fn is_timed(&self) -> bool {
        self.time_per_question > 0
    }

    #[must_use]
    pub fn window(&self) -> AvailabilityWindow {
        self.window
    }

    #[must_use]
    pub fn availability(&self, now: DateTime<Utc>) -> QuizAvailability {
        self.window.availability(now)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn question(id: &str) -> Question {
        Question::new(QuestionId::new(id), "Q", vec!["a".into(), "b".into()]).unwrap()
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let err = Quiz::new(QuizId::new("z"), "Empty", Vec::new(), 10).unwrap_err();
        assert_eq!(err, QuizError::NoQuestions);
        assert_eq!(err.to_string(), "no questions available");
    }

    #[test]
    fn duplicate_question_ids_are_rejected() {
        let err = Quiz::new(
            QuizId::new("z"),
            "Dup",
            vec![question("q1"), question("q2"), question("q1")],
            0,
        )
        .unwrap_err();
        assert_eq!(err, QuizError::DuplicateQuestion(QuestionId::new("q1")));
    }

    #[test]
    fn lookup_by_id_and_index() {
        let quiz = Quiz::new(QuizId::new("z"), "T", vec![question("q1"), question("q2")], 0)
            .unwrap();
        assert_eq!(quiz.len(), 2);
        assert!(!quiz.is_timed());
        assert_eq!(quiz.question(1).map(Question::id), Some(&QuestionId::new("q2")));
        assert!(quiz.find_question(&QuestionId::new("missing")).is_none());
    }

    #[test]
    fn availability_follows_window() {
        let now = fixed_now();
        let window =
            AvailabilityWindow::new(Some(now - Duration::hours(1)), Some(now + Duration::hours(1)))
                .unwrap();
        assert_eq!(window.availability(now), QuizAvailability::Open);
        assert_eq!(
            window.availability(now - Duration::hours(2)),
            QuizAvailability::Upcoming
        );
        assert_eq!(
            window.availability(now + Duration::hours(2)),
            QuizAvailability::Ended
        );
        assert_eq!(
            AvailabilityWindow::default().availability(now),
            QuizAvailability::Open
        );
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = fixed_now();
        let err = AvailabilityWindow::new(Some(now), Some(now - Duration::seconds(1))).unwrap_err();
        assert_eq!(err, QuizError::InvalidWindow);
    }
}
