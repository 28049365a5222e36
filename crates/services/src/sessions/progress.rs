use std::sync::Arc;

use quiz_core::model::{AnswerMap, Quiz};

use super::state::SessionStatus;

/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProgress {
    pub total: usize,
    pub answered: usize,
    pub current_index: usize,
    pub remaining_secs: Option<u32>,
    pub status: SessionStatus,
}

/// Point-in-time copy of a session for rendering outside the session lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub quiz: Arc<Quiz>,
    pub answers: AnswerMap,
    pub progress: SessionProgress,
}
