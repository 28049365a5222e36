//! Shared error types for the services crate.

use std::fmt;

use thiserror::Error;

use quiz_core::model::{QuestionId, QuizError};

/// Errors surfaced by backend collaborators (REST adapter or fakes).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    #[error("backend rejected the credential")]
    Unauthorized,
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("cannot build endpoint url from {0}")]
    Endpoint(String),
}

/// Which half of session loading failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Participation,
    Content,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadStage::Participation => f.write_str("participation"),
            LoadStage::Content => f.write_str("content"),
        }
    }
}

/// A backend call failed while loading a session; no partial session exists.
#[derive(Debug, Error)]
#[error("failed to load quiz session ({stage} stage)")]
pub struct SessionLoadError {
    stage: LoadStage,
    #[source]
    cause: BackendError,
}

impl SessionLoadError {
    #[must_use]
    pub fn new(stage: LoadStage, cause: BackendError) -> Self {
        Self { stage, cause }
    }

    #[must_use]
    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    #[must_use]
    pub fn cause(&self) -> &BackendError {
        &self.cause
    }
}

/// Errors that keep a session from reaching `Active`.
///
/// All of them are fatal to the attempt; the caller offers a fresh start.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StartError {
    #[error("authentication required")]
    Unauthenticated,
    #[error(transparent)]
    Load(#[from] SessionLoadError),
    #[error(transparent)]
    InvalidQuiz(#[from] QuizError),
    #[error("session start was cancelled")]
    Cancelled,
}

/// Contract violations on a running session. State is left untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is not active")]
    NotActive,
    #[error("question {0} is not part of this quiz")]
    UnknownQuestion(QuestionId),
    #[error("option {index} out of range ({len} options)")]
    OptionOutOfRange { index: usize, len: usize },
    #[error("question index {index} out of range ({len} questions)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Why a submission could not be reconciled. Never shown to the user.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    #[error("no credential available for submission")]
    MissingCredential,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("could not read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}
