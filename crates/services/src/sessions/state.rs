use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

use quiz_core::model::{
    AnswerMap, AttemptId, ParticipationId, Question, QuestionId, Quiz, SessionResult,
};
use quiz_core::time::elapsed_secs;

use crate::error::SessionError;
use super::loader::LoadedSession;
use super::progress::{SessionProgress, SessionSnapshot};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a loaded session. Loading happens before construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Submitted,
    Exited,
}

/// What a single timer tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Not active, or the quiz is untimed.
    Idle,
    Counting { remaining_secs: u32 },
    /// The current question ran out and the cursor moved on.
    Advanced { index: usize },
    /// The last question ran out and the session submitted itself.
    Submitted(SessionResult),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Quiz-taking state machine: cursor, countdown and answers for one attempt.
///
/// Pure and synchronous. Timers and network hand-off live in the session
/// driver; time comes in as arguments.
pub struct QuizSession {
    attempt_id: AttemptId,
    quiz: Arc<Quiz>,
    participation_id: ParticipationId,
    answers: AnswerMap,
    current: usize,
    remaining_secs: Option<u32>,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    submitted_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start an attempt on the first question with a full countdown.
    #[must_use]
    pub fn new(loaded: &LoadedSession, started_at: DateTime<Utc>) -> Self {
        let mut session = Self {
            attempt_id: loaded.attempt_id,
            quiz: Arc::clone(&loaded.quiz),
            participation_id: loaded.participation_id.clone(),
            answers: AnswerMap::new(),
            current: 0,
            remaining_secs: None,
            status: SessionStatus::Active,
            started_at,
            submitted_at: None,
        };
        session.reset_countdown();
        session
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    #[must_use]
    pub fn participation_id(&self) -> &ParticipationId {
        &self.participation_id
    }

    #[must_use]
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Seconds left on the current question; `None` for untimed quizzes
    /// or once the session is no longer active.
    #[must_use]
    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.quiz.questions()[self.current]
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.current + 1 == self.quiz.len()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.quiz.len(),
            answered: self.answers.len(),
            current_index: self.current,
            remaining_secs: self.remaining_secs,
            status: self.status,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            quiz: Arc::clone(&self.quiz),
            answers: self.answers.clone(),
            progress: self.progress(),
        }
    }

    /// Record `option_index` for `question_id`, replacing any earlier pick.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`,
    /// `SessionError::UnknownQuestion` or `SessionError::OptionOutOfRange`
    /// for bad arguments. The answer map is untouched on error.
    pub fn select_answer(
        &mut self,
        question_id: &QuestionId,
        option_index: usize,
    ) -> Result<(), SessionError> {
        self.ensure_active()?;
        let question = self
            .quiz
            .find_question(question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))?;
        if option_index >= question.option_count() {
            return Err(SessionError::OptionOutOfRange {
                index: option_index,
                len: question.option_count(),
            });
        }
        self.answers.select(question_id.clone(), option_index);
        Ok(())
    }

    /// Answer the question under the cursor.
    ///
    /// # Errors
    ///
    /// Same as `select_answer`.
    pub fn select_current(&mut self, option_index: usize) -> Result<(), SessionError> {
        let question_id = self.current_question().id().clone();
        self.select_answer(&question_id, option_index)
    }

    /// Move to the next question. Returns `false` on the last question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`.
    pub fn go_next(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if self.is_last_question() {
            return Ok(false);
        }
        self.move_to(self.current + 1);
        Ok(true)
    }

    /// Move to the previous question. Returns `false` on the first question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active`.
    pub fn go_previous(&mut self) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if self.current == 0 {
            return Ok(false);
        }
        self.move_to(self.current - 1);
        Ok(true)
    }

    /// Jump to any question, answered or not. Returns whether the cursor moved.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` outside `Active` and
    /// `SessionError::IndexOutOfRange` for an index past the end.
    pub fn jump_to(&mut self, index: usize) -> Result<bool, SessionError> {
        self.ensure_active()?;
        if index >= self.quiz.len() {
            return Err(SessionError::IndexOutOfRange {
                index,
                len: self.quiz.len(),
            });
        }
        if index == self.current {
            return Ok(false);
        }
        self.move_to(index);
        Ok(true)
    }

    /// Advance the countdown by one second.
    ///
    /// When the current question runs out the cursor moves on with a fresh
    /// countdown; on the last question the session submits at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if !self.is_active() {
            return TickOutcome::Idle;
        }
        let Some(remaining) = self.remaining_secs else {
            return TickOutcome::Idle;
        };

        if remaining > 1 {
            self.remaining_secs = Some(remaining - 1);
            return TickOutcome::Counting {
                remaining_secs: remaining - 1,
            };
        }

        if self.is_last_question() {
            self.remaining_secs = Some(0);
            return match self.submit(now) {
                Some(result) => TickOutcome::Submitted(result),
                None => TickOutcome::Idle,
            };
        }

        self.move_to(self.current + 1);
        TickOutcome::Advanced {
            index: self.current,
        }
    }

    /// Transition `Active -> Submitted` and freeze the answers.
    ///
    /// Returns the local result on the first call only; later calls (or calls
    /// after `exit`) return `None` and change nothing.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Option<SessionResult> {
        if !self.is_active() {
            return None;
        }
        self.status = SessionStatus::Submitted;
        self.submitted_at = Some(now);
        self.remaining_secs = None;

        Some(SessionResult::local(
            Arc::clone(&self.quiz),
            self.participation_id.clone(),
            self.answers.clone(),
            elapsed_secs(self.started_at, now),
        ))
    }

    /// Tear the session down without submitting. Valid in any state.
    pub fn exit(&mut self) {
        self.status = SessionStatus::Exited;
        self.remaining_secs = None;
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SessionError::NotActive)
        }
    }

    fn move_to(&mut self, index: usize) {
        self.current = index;
        self.reset_countdown();
    }

    fn reset_countdown(&mut self) {
        self.remaining_secs = self
            .quiz
            .is_timed()
            .then(|| self.quiz.time_per_question());
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("attempt_id", &self.attempt_id)
            .field("quiz_id", self.quiz.id())
            .field("participation_id", &self.participation_id)
            .field("current", &self.current)
            .field("answered", &self.answers.len())
            .field("remaining_secs", &self.remaining_secs)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
