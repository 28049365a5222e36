use thiserror::Error;

use crate::model::ids::QuestionId;

/// Minimum number of options a playable question must offer.
pub const MIN_OPTIONS: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question needs at least 2 options, got {len}")]
    TooFewOptions { len: usize },
}

/// A multiple-choice question as served for a session.
///
/// Options are kept in server order; answers refer to them by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    text: String,
    options: Vec<String>,
    category: Option<String>,
    difficulty: Option<String>,
}

impl Question {
    /// Creates a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::TooFewOptions` if fewer than two options are given.
    pub fn new(
        id: QuestionId,
        text: impl Into<String>,
        options: Vec<String>,
    ) -> Result<Self, QuestionError> {
        if options.len() < MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }

        Ok(Self {
            id,
            text: text.into(),
            options,
            category: None,
            difficulty: None,
        })
    }

    #[must_use]
    pub fn with_category(mut self, category: Option<String>) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: Option<String>) -> Self {
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn option_count(&self) -> usize {
        self.options.len()
    }

    /// Text of the option at `index`, if it exists.
    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }
}
