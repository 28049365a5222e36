//! Collaborator contracts consumed by the quiz session core, plus the wire
//! records that cross them.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use quiz_core::model::{
    AvailabilityWindow, ParticipationId, Question, QuestionId, Quiz, QuizError, QuizId,
    ReviewedAnswer, ScorePatch,
};

use crate::error::{BackendError, ReconcileError};

//
// ─── IDENTITY ──────────────────────────────────────────────────────────────────
//

/// Authorization credential attached to every backend request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    scheme: String,
    token: String,
}

impl Credential {
    #[must_use]
    pub fn new(scheme: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new("Bearer", token)
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Value for the `Authorization` header, e.g. `Bearer abc`.
    #[must_use]
    pub fn header_value(&self) -> String {
        format!("{} {}", self.scheme, self.token)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("scheme", &self.scheme)
            .finish_non_exhaustive()
    }
}

/// Supplies the current credential; `None` means the user is signed out.
pub trait IdentityProvider: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

//
// ─── QUIZ CONTENT ──────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipationRecord {
    pub participation_id: ParticipationId,
}

/// Wire shape of a question inside `QuizRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRecord {
    pub id: QuestionId,
    #[serde(alias = "question")]
    pub question_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

/// Wire shape of a quiz with its questions.
///
/// Converted into the domain `Quiz` by `into_quiz`, which is where an empty
/// question list is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRecord {
    #[serde(alias = "id")]
    pub quiz_id: QuizId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub time_per_question: Option<u32>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub questions: Vec<QuestionRecord>,
}

impl QuizRecord {
    /// Validate the record into a playable `Quiz`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoQuestions` for an empty list, `QuizError::InvalidQuestion`
    /// for a question with fewer than two options, and other `QuizError`s for
    /// duplicate ids or an inverted window.
    pub fn into_quiz(self) -> Result<Quiz, QuizError> {
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let questions = self
            .questions
            .into_iter()
            .map(|record| {
                let id = record.id.clone();
                Question::new(record.id, record.question_text, record.options)
                    .map(|q| {
                        q.with_category(record.category)
                            .with_difficulty(record.difficulty)
                    })
                    .map_err(|source| QuizError::InvalidQuestion {
                        question_id: id,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let window = AvailabilityWindow::new(self.start_time, self.end_time)?;
        Ok(Quiz::new(
            self.quiz_id,
            self.title,
            questions,
            self.time_per_question.unwrap_or(0),
        )?
        .with_description(self.description)
        .with_window(window))
    }
}

// Backends disagree on timestamp zones; accept RFC 3339 or a naive UTC value
// and drop anything else rather than failing the whole load.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => Some(naive.and_utc()),
        Err(_) => {
            tracing::debug!(value = raw, "ignoring unparseable quiz timestamp");
            None
        }
    }
}

/// Backend calls needed to open a session.
#[async_trait]
pub trait QuizContentService: Send + Sync {
    /// Create a participation record for one attempt.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport failures or non-2xx responses.
    async fn create_participation(
        &self,
        quiz_id: &QuizId,
        credential: &Credential,
    ) -> Result<ParticipationRecord, BackendError>;

    /// Fetch quiz metadata together with its ordered questions.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport failures or non-2xx responses.
    async fn get_quiz_with_questions(
        &self,
        quiz_id: &QuizId,
        credential: &Credential,
    ) -> Result<QuizRecord, BackendError>;
}

//
// ─── SUBMISSION ────────────────────────────────────────────────────────────────
//

/// One answer as the backend expects it: option text, not index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: QuestionId,
    pub selected_option: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerReviewRecord {
    pub question_id: QuestionId,
    #[serde(default)]
    pub submitted_answer: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Backend response to a submission. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub total_questions: Option<usize>,
    #[serde(default)]
    pub answers: Option<Vec<AnswerReviewRecord>>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SubmissionReceipt {
    #[must_use]
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn into_patch(self) -> ScorePatch {
        ScorePatch {
            score: self.score,
            percentage: self.percentage,
            total_questions: self.total_questions,
            answers: self.answers.map(|answers| {
                answers
                    .into_iter()
                    .map(|record| ReviewedAnswer {
                        question_id: record.question_id,
                        submitted_answer: record.submitted_answer,
                        correct_answer: record.correct_answer,
                        explanation: record.explanation,
                    })
                    .collect()
            }),
            message: self.message.filter(|m| !m.trim().is_empty()),
        }
    }
}

#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Submit the answers of a participation for scoring.
    ///
    /// # Errors
    ///
    /// Returns `BackendError` for transport failures or non-2xx responses.
    async fn submit_answers(
        &self,
        participation_id: &ParticipationId,
        answers: &[SubmittedAnswer],
        credential: &Credential,
    ) -> Result<SubmissionReceipt, BackendError>;
}

//
// ─── OBSERVABILITY ─────────────────────────────────────────────────────────────
//

/// Sink for reconciliation failures. Must not block or panic.
pub trait ReconciliationObserver: Send + Sync {
    fn reconciliation_failed(&self, participation_id: &ParticipationId, error: &ReconcileError);
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
