use std::collections::HashMap;

use crate::model::ids::QuestionId;

/// Selected option index per question for one attempt.
///
/// An absent key means the question is unanswered. Overwriting keeps the
/// position of the first answer, so iteration runs in first-answered order.
#[derive(Debug, Clone, Default)]
pub struct AnswerMap {
    order: Vec<QuestionId>,
    selections: HashMap<QuestionId, usize>,
}

impl AnswerMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option_index` for `question_id`, returning the previous selection.
    pub fn select(&mut self, question_id: QuestionId, option_index: usize) -> Option<usize> {
        let previous = self.selections.insert(question_id.clone(), option_index);
        if previous.is_none() {
            self.order.push(question_id);
        }
        previous
    }

    #[must_use]
    pub fn get(&self, question_id: &QuestionId) -> Option<usize> {
        self.selections.get(question_id).copied()
    }

    #[must_use]
    pub fn is_answered(&self, question_id: &QuestionId) -> bool {
        self.selections.contains_key(question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Iterates selections in first-answered order.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, usize)> + '_ {
        self.order
            .iter()
            .filter_map(|id| self.selections.get(id).map(|index| (id, *index)))
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.selections.clear();
    }
}

// Equality is about content; first-answered order is UX only.
impl PartialEq for AnswerMap {
    fn eq(&self, other: &Self) -> bool {
        self.selections == other.selections
    }
}

impl Eq for AnswerMap {}

impl<const N: usize> From<[(QuestionId, usize); N]> for AnswerMap {
    fn from(entries: [(QuestionId, usize); N]) -> Self {
        let mut map = Self::new();
        for (id, index) in entries {
            map.select(id, index);
        }
        map
    }
}
