use std::sync::Arc;

use crate::model::answers::AnswerMap;
use crate::model::ids::{ParticipationId, QuestionId};
use crate::model::quiz::Quiz;

/// Server verdict for one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewedAnswer {
    pub question_id: QuestionId,
    pub submitted_answer: Option<String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
}

impl ReviewedAnswer {
    /// True when the server reports both values and they match.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        matches!(
            (&self.submitted_answer, &self.correct_answer),
            (Some(submitted), Some(correct)) if submitted == correct
        )
    }
}

/// Authoritative fields returned by the backend after submission.
///
/// `None` means "not provided"; merging never clears an existing value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScorePatch {
    pub score: Option<u32>,
    pub percentage: Option<f64>,
    pub total_questions: Option<usize>,
    pub answers: Option<Vec<ReviewedAnswer>>,
    pub message: Option<String>,
}

/// Outcome of one attempt.
///
/// Local metrics are fixed at submission. Server fields stay `None` until a
/// reconciliation patch is merged; `None` means "not yet confirmed", not zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    quiz: Arc<Quiz>,
    participation_id: ParticipationId,
    answers: AnswerMap,
    elapsed_secs: u64,
    answered_count: usize,
    total_questions: usize,

    score: Option<u32>,
    percentage: Option<f64>,
    reviewed: Option<Vec<ReviewedAnswer>>,
    submission_message: Option<String>,
}

impl SessionResult {
    /// Builds the unreconciled result captured at submission time.
    #[must_use]
    pub fn local(
        quiz: Arc<Quiz>,
        participation_id: ParticipationId,
        answers: AnswerMap,
        elapsed_secs: u64,
    ) -> Self {
        let answered_count = answers.len();
        let total_questions = quiz.len();
        Self {
            quiz,
            participation_id,
            answers,
            elapsed_secs,
            answered_count,
            total_questions,
            score: None,
            percentage: None,
            reviewed: None,
            submission_message: None,
        }
    }

    /// Overwrites every field the patch provides and keeps the rest.
    pub fn merge(&mut self, patch: ScorePatch) {
        if let Some(score) = patch.score {
            self.score = Some(score);
        }
        if let Some(percentage) = patch.percentage {
            self.percentage = Some(percentage);
        }
        if let Some(total) = patch.total_questions {
            self.total_questions = total;
        }
        if let Some(answers) = patch.answers {
            self.reviewed = Some(answers);
        }
        if let Some(message) = patch.message.filter(|m| !m.trim().is_empty()) {
            self.submission_message = Some(message);
        }
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
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answered_count
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    #[must_use]
    pub fn percentage(&self) -> Option<f64> {
        self.percentage
    }

    #[must_use]
    pub fn reviewed(&self) -> Option<&[ReviewedAnswer]> {
        self.reviewed.as_deref()
    }

    #[must_use]
    pub fn reviewed_answer(&self, question_id: &QuestionId) -> Option<&ReviewedAnswer> {
        self.reviewed
            .as_ref()?
            .iter()
            .find(|review| &review.question_id == question_id)
    }

    #[must_use]
    pub fn submission_message(&self) -> Option<&str> {
        self.submission_message.as_deref()
    }

    /// Whether any server-provided field has been merged.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.score.is_some()
            || self.percentage.is_some()
            || self.reviewed.is_some()
            || self.submission_message.is_some()
    }
}
