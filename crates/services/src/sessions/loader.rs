use std::sync::Arc;

use quiz_core::model::{AttemptId, ParticipationId, Quiz, QuizId};

use crate::error::{LoadStage, SessionLoadError, StartError};
use crate::ports::{IdentityProvider, QuizContentService};

/// Everything a session needs once loading succeeded.
#[derive(Debug, Clone)]
pub struct LoadedSession {
    pub attempt_id: AttemptId,
    pub quiz: Arc<Quiz>,
    pub participation_id: ParticipationId,
}

/// Opens a participation, then fetches quiz content, in that order.
#[derive(Clone)]
pub struct SessionLoader {
    identity: Arc<dyn IdentityProvider>,
    content: Arc<dyn QuizContentService>,
}

impl SessionLoader {
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        content: Arc<dyn QuizContentService>,
    ) -> Self {
        Self { identity, content }
    }

    /// Load a fresh attempt for `quiz_id`.
    ///
    /// Each call creates a new participation, so retrying after a failure
    /// never reuses a stale record. Content is requested only after the
    /// participation exists.
    ///
    /// # Errors
    ///
    /// Returns `StartError::Unauthenticated` when no credential is available,
    /// `StartError::Load` tagged with the failing stage, or
    /// `StartError::InvalidQuiz` when the content is not playable (e.g. no questions).
    pub async fn load_session(&self, quiz_id: &QuizId) -> Result<LoadedSession, StartError> {
        let credential = self
            .identity
            .credential()
            .ok_or(StartError::Unauthenticated)?;
        let attempt_id = AttemptId::generate();
        tracing::debug!(%quiz_id, %attempt_id, "creating participation");

        let participation = self
            .content
            .create_participation(quiz_id, &credential)
            .await
            .map_err(|cause| {
                tracing::warn!(%quiz_id, error = %cause, "participation create failed");
                SessionLoadError::new(LoadStage::Participation, cause)
            })?;

        let record = self
            .content
            .get_quiz_with_questions(quiz_id, &credential)
            .await
            .map_err(|cause| {
                tracing::warn!(%quiz_id, error = %cause, "quiz content fetch failed");
                SessionLoadError::new(LoadStage::Content, cause)
            })?;

        let quiz = record.into_quiz().inspect_err(|err| {
            tracing::warn!(%quiz_id, error = %err, "quiz content is not playable");
        })?;

        tracing::info!(
            %quiz_id,
            %attempt_id,
            participation_id = %participation.participation_id,
            questions = quiz.len(),
            "quiz session loaded"
        );

        Ok(LoadedSession {
            attempt_id,
            quiz: Arc::new(quiz),
            participation_id: participation.participation_id,
        })
    }
}
