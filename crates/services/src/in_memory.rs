use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Notify;

use quiz_core::model::{ParticipationId, QuestionId, QuizId};

use crate::error::BackendError;
use crate::ports::{
    AnswerReviewRecord, Credential, ParticipationRecord, QuizContentService, QuizRecord,
    SubmissionReceipt, SubmissionService, SubmittedAnswer,
};

/// A call observed by `InMemoryQuizBackend`, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    CreateParticipation(QuizId),
    GetQuiz(QuizId),
    SubmitAnswers(ParticipationId),
}

/// Correct option text (and optional explanation) for one question.
#[derive(Debug, Clone)]
struct AnswerKey {
    correct: String,
    explanation: Option<String>,
}

#[derive(Default)]
struct BackendState {
    quizzes: HashMap<QuizId, QuizRecord>,
    answer_keys: HashMap<QuizId, HashMap<QuestionId, AnswerKey>>,
    participations: HashMap<ParticipationId, QuizId>,
    submissions: Vec<(ParticipationId, Vec<SubmittedAnswer>)>,
    calls: Vec<BackendCall>,
    next_participation: u64,
    participation_failure: Option<StatusCode>,
    content_failure: Option<StatusCode>,
    submission_failure: Option<StatusCode>,
    scripted_receipt: Option<SubmissionReceipt>,
    held: bool,
}

/// In-memory backend for tests and offline prototyping.
///
/// Scores submissions against an optional answer key, records every call,
/// can fail any endpoint with a status code, and can hold calls until
/// `release_calls` is invoked.
#[derive(Clone, Default)]
pub struct InMemoryQuizBackend {
    state: Arc<Mutex<BackendState>>,
    gate: Arc<Notify>,
}

impl InMemoryQuizBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn insert_quiz(&self, record: QuizRecord) {
        self.lock().quizzes.insert(record.quiz_id.clone(), record);
    }

    /// Register the correct option text for a question of `quiz_id`.
    pub fn set_answer(
        &self,
        quiz_id: &QuizId,
        question_id: &QuestionId,
        correct: impl Into<String>,
        explanation: Option<&str>,
    ) {
        self.lock()
            .answer_keys
            .entry(quiz_id.clone())
            .or_default()
            .insert(
                question_id.clone(),
                AnswerKey {
                    correct: correct.into(),
                    explanation: explanation.map(str::to_owned),
                },
            );
    }

    pub fn fail_participation(&self, status: StatusCode) {
        self.lock().participation_failure = Some(status);
    }

    pub fn fail_content(&self, status: StatusCode) {
        self.lock().content_failure = Some(status);
    }

    pub fn fail_submissions(&self, status: StatusCode) {
        self.lock().submission_failure = Some(status);
    }

    /// Answer every subsequent submission with `receipt` instead of scoring it.
    pub fn reply_to_submissions(&self, receipt: SubmissionReceipt) {
        self.lock().scripted_receipt = Some(receipt);
    }

    /// Make every subsequent call wait until `release_calls`.
    pub fn hold_calls(&self) {
        self.lock().held = true;
    }

    pub fn release_calls(&self) {
        self.lock().held = false;
        self.gate.notify_waiters();
    }

    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    #[must_use]
    pub fn submissions(&self) -> Vec<(ParticipationId, Vec<SubmittedAnswer>)> {
        self.lock().submissions.clone()
    }

    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.lock().submissions.len()
    }

    async fn enter(&self, call: BackendCall) {
        self.lock().calls.push(call);
        loop {
            let notified = self.gate.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let held = self.lock().held;
            if !held {
                return;
            }
            notified.await;
        }
    }

    fn score(
        state: &BackendState,
        quiz_id: &QuizId,
        answers: &[SubmittedAnswer],
    ) -> SubmissionReceipt {
        let Some(quiz) = state.quizzes.get(quiz_id) else {
            return SubmissionReceipt::with_message("Quiz submitted");
        };
        let key = state.answer_keys.get(quiz_id);

        let mut score = 0u32;
        let reviews: Vec<AnswerReviewRecord> = quiz
            .questions
            .iter()
            .map(|question| {
                let submitted = answers
                    .iter()
                    .find(|a| a.question_id == question.id)
                    .map(|a| a.selected_option.clone());
                let expected = key.and_then(|k| k.get(&question.id));
                if let (Some(s), Some(e)) = (&submitted, expected) {
                    if *s == e.correct {
                        score += 1;
                    }
                }
                AnswerReviewRecord {
                    question_id: question.id.clone(),
                    submitted_answer: submitted,
                    correct_answer: expected.map(|e| e.correct.clone()),
                    explanation: expected.and_then(|e| e.explanation.clone()),
                }
            })
            .collect();

        let total = reviews.len();
        #[allow(clippy::cast_precision_loss)]
        let percentage = if total == 0 {
            0.0
        } else {
            f64::from(score) * 100.0 / total as f64
        };

        SubmissionReceipt {
            score: Some(score),
            percentage: Some(percentage),
            total_questions: Some(total),
            answers: Some(reviews),
            message: Some("Quiz submitted".into()),
        }
    }
}

#[async_trait]
impl QuizContentService for InMemoryQuizBackend {
    async fn create_participation(
        &self,
        quiz_id: &QuizId,
        _credential: &Credential,
    ) -> Result<ParticipationRecord, BackendError> {
        self.enter(BackendCall::CreateParticipation(quiz_id.clone()))
            .await;
        let mut state = self.lock();
        if let Some(status) = state.participation_failure {
            return Err(BackendError::HttpStatus(status));
        }
        if !state.quizzes.contains_key(quiz_id) {
            return Err(BackendError::HttpStatus(StatusCode::NOT_FOUND));
        }
        state.next_participation += 1;
        let participation_id = ParticipationId::new(format!("p-{}", state.next_participation));
        state
            .participations
            .insert(participation_id.clone(), quiz_id.clone());
        Ok(ParticipationRecord { participation_id })
    }

    async fn get_quiz_with_questions(
        &self,
        quiz_id: &QuizId,
        _credential: &Credential,
    ) -> Result<QuizRecord, BackendError> {
        self.enter(BackendCall::GetQuiz(quiz_id.clone())).await;
        let state = self.lock();
        if let Some(status) = state.content_failure {
            return Err(BackendError::HttpStatus(status));
        }
        state
            .quizzes
            .get(quiz_id)
            .cloned()
            .ok_or(BackendError::HttpStatus(StatusCode::NOT_FOUND))
    }
}

#[async_trait]
impl SubmissionService for InMemoryQuizBackend {
    async fn submit_answers(
        &self,
        participation_id: &ParticipationId,
        answers: &[SubmittedAnswer],
        _credential: &Credential,
    ) -> Result<SubmissionReceipt, BackendError> {
        self.enter(BackendCall::SubmitAnswers(participation_id.clone()))
            .await;
        let mut state = self.lock();
        if let Some(status) = state.submission_failure {
            return Err(BackendError::HttpStatus(status));
        }
        let quiz_id = state
            .participations
            .get(participation_id)
            .cloned()
            .ok_or(BackendError::HttpStatus(StatusCode::NOT_FOUND))?;
        state
            .submissions
            .push((participation_id.clone(), answers.to_vec()));
        if let Some(receipt) = state.scripted_receipt.clone() {
            return Ok(receipt);
        }
        Ok(Self::score(&state, &quiz_id, answers))
    }
}
