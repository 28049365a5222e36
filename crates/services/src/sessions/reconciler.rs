use std::sync::Arc;

use quiz_core::model::{AnswerMap, ParticipationId, Quiz, ScorePatch};

use crate::error::ReconcileError;
use crate::ports::{IdentityProvider, ReconciliationObserver, SubmissionService, SubmittedAnswer};

/// Translate index-based selections into the option-text payload the
/// backend scores, in first-answered order.
///
/// A selection that no longer resolves (unknown question or index past the
/// option list) is sent as the raw index so the backend still sees it.
#[must_use]
pub fn build_submission(answers: &AnswerMap, quiz: &Quiz) -> Vec<SubmittedAnswer> {
    answers
        .iter()
        .map(|(question_id, index)| {
            let selected_option = quiz
                .find_question(question_id)
                .and_then(|question| question.option(index))
                .map_or_else(
                    || {
                        tracing::warn!(
                            %question_id,
                            index,
                            "selection does not resolve to an option; sending raw index"
                        );
                        index.to_string()
                    },
                    str::to_owned,
                );
            SubmittedAnswer {
                question_id: question_id.clone(),
                selected_option,
            }
        })
        .collect()
}

/// Sends a submitted session to the backend once and turns the response
/// into a `ScorePatch`. Failures go to the observer, never to the caller.
#[derive(Clone)]
pub struct Reconciler {
    identity: Arc<dyn IdentityProvider>,
    submissions: Arc<dyn SubmissionService>,
    observer: Arc<dyn ReconciliationObserver>,
}

impl Reconciler {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        submissions: Arc<dyn SubmissionService>,
        observer: Arc<dyn ReconciliationObserver>,
    ) -> Self {
        Self {
            identity,
            submissions,
            observer,
        }
    }

    /// Submit `answers` for `participation_id`. Returns `None` when the
    /// attempt failed; the local result should then stand as final.
    pub async fn reconcile(
        &self,
        participation_id: &ParticipationId,
        answers: &AnswerMap,
        quiz: &Quiz,
    ) -> Option<ScorePatch> {
        match self.try_reconcile(participation_id, answers, quiz).await {
            Ok(patch) => {
                tracing::info!(
                    %participation_id,
                    score = ?patch.score,
                    percentage = ?patch.percentage,
                    "submission reconciled"
                );
                Some(patch)
            }
            Err(err) => {
                self.observer.reconciliation_failed(participation_id, &err);
                None
            }
        }
    }

    async fn try_reconcile(
        &self,
        participation_id: &ParticipationId,
        answers: &AnswerMap,
        quiz: &Quiz,
    ) -> Result<ScorePatch, ReconcileError> {
        let credential = self
            .identity
            .credential()
            .ok_or(ReconcileError::MissingCredential)?;
        let payload = build_submission(answers, quiz);
        tracing::debug!(%participation_id, answers = payload.len(), "submitting answers");

        let receipt = self
            .submissions
            .submit_answers(participation_id, &payload, &credential)
            .await?;
        Ok(receipt.into_patch())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentity;
    use crate::in_memory::InMemoryQuizBackend;
    use crate::observability::RecordingObserver;
    use crate::ports::{IdentityProvider as _, QuestionRecord, QuizContentService, QuizRecord};
    use quiz_core::model::{QuestionId, QuizId};
    use reqwest::StatusCode;

    fn record() -> QuizRecord {
        QuizRecord {
            quiz_id: QuizId::new("quiz"),
            title: "Capitals".into(),
            description: None,
            time_per_question: None,
            start_time: None,
            end_time: None,
            questions: vec![
                QuestionRecord {
                    id: QuestionId::new("q1"),
                    question_text: "Capital of France?".into(),
                    options: vec!["Berlin".into(), "Paris".into(), "Rome".into()],
                    category: None,
                    difficulty: None,
                },
                QuestionRecord {
                    id: QuestionId::new("q2"),
                    question_text: "Capital of Italy?".into(),
                    options: vec!["Rome".into(), "Madrid".into()],
                    category: None,
                    difficulty: None,
                },
            ],
        }
    }

    async fn participation(backend: &InMemoryQuizBackend) -> ParticipationId {
        let credential = StaticIdentity::bearer("t").credential().unwrap();
        backend
            .create_participation(&QuizId::new("quiz"), &credential)
            .await
            .unwrap()
            .participation_id
    }

    fn reconciler(
        backend: &InMemoryQuizBackend,
        identity: StaticIdentity,
        observer: &Arc<RecordingObserver>,
    ) -> Reconciler {
        Reconciler::new(
            Arc::new(identity),
            Arc::new(backend.clone()),
            Arc::clone(observer) as Arc<dyn ReconciliationObserver>,
        )
    }

    #[test]
    fn submission_uses_option_text_in_answer_order() {
        let quiz = record().into_quiz().unwrap();
        let answers = AnswerMap::from([(QuestionId::new("q2"), 0), (QuestionId::new("q1"), 1)]);

        let payload = build_submission(&answers, &quiz);

        let sent: Vec<_> = payload
            .iter()
            .map(|a| (a.question_id.as_str(), a.selected_option.as_str()))
            .collect();
        assert_eq!(sent, vec![("q2", "Rome"), ("q1", "Paris")]);
    }

    #[test]
    fn unresolvable_selection_falls_back_to_raw_index() {
        let quiz = record().into_quiz().unwrap();
        let answers = AnswerMap::from([(QuestionId::new("ghost"), 4)]);

        let payload = build_submission(&answers, &quiz);

        assert_eq!(
            payload,
            vec![SubmittedAnswer {
                question_id: QuestionId::new("ghost"),
                selected_option: "4".into(),
            }]
        );
    }

    #[tokio::test]
    async fn successful_submission_yields_score_patch() {
        let backend = InMemoryQuizBackend::new();
        backend.insert_quiz(record());
        backend.set_answer(&QuizId::new("quiz"), &QuestionId::new("q1"), "Paris", Some("Paris is the capital"));
        backend.set_answer(&QuizId::new("quiz"), &QuestionId::new("q2"), "Rome", None);
        let pid = participation(&backend).await;
        let quiz = record().into_quiz().unwrap();
        let observer = Arc::new(RecordingObserver::new());

        let answers = AnswerMap::from([(QuestionId::new("q1"), 1)]);
        let patch = reconciler(&backend, StaticIdentity::bearer("t"), &observer)
            .reconcile(&pid, &answers, &quiz)
            .await
            .unwrap();

        assert_eq!(patch.score, Some(1));
        assert_eq!(patch.percentage, Some(50.0));
        assert_eq!(patch.total_questions, Some(2));
        assert_eq!(patch.answers.map(|a| a.len()), Some(2));
        assert!(observer.failures().is_empty());
        assert_eq!(backend.submission_count(), 1);
    }

    #[tokio::test]
    async fn backend_failure_is_reported_once_and_not_retried() {
        let backend = InMemoryQuizBackend::new();
        backend.insert_quiz(record());
        let pid = participation(&backend).await;
        backend.fail_submissions(StatusCode::SERVICE_UNAVAILABLE);
        let quiz = record().into_quiz().unwrap();
        let observer = Arc::new(RecordingObserver::new());

        let patch = reconciler(&backend, StaticIdentity::bearer("t"), &observer)
            .reconcile(&pid, &AnswerMap::new(), &quiz)
            .await;

        assert!(patch.is_none());
        let failures = observer.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, pid);
        let submit_calls = backend
            .calls()
            .into_iter()
            .filter(|c| matches!(c, crate::in_memory::BackendCall::SubmitAnswers(_)))
            .count();
        assert_eq!(submit_calls, 1);
    }

    #[tokio::test]
    async fn missing_credential_is_reported_without_calling_backend() {
        let backend = InMemoryQuizBackend::new();
        backend.insert_quiz(record());
        let pid = participation(&backend).await;
        let quiz = record().into_quiz().unwrap();
        let observer = Arc::new(RecordingObserver::new());

        let patch = reconciler(&backend, StaticIdentity::signed_out(), &observer)
            .reconcile(&pid, &AnswerMap::new(), &quiz)
            .await;

        assert!(patch.is_none());
        assert_eq!(
            observer.failures()[0].1,
            "no credential available for submission"
        );
        assert_eq!(backend.submission_count(), 0);
    }
}
