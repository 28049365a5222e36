use quiz_core::model::{Question, SessionResult};

use crate::vm::time_fmt::format_duration;

/// Qualitative band for the completion rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PerformanceTier {
    Excellent,
    Great,
    Good,
    KeepPracticing,
}

impl PerformanceTier {
    /// Exact boundaries belong to the higher tier.
    #[must_use]
    pub fn from_completion(percent: u32) -> Self {
        match percent {
            100.. => Self::Excellent,
            80..=99 => Self::Great,
            60..=79 => Self::Good,
            _ => Self::KeepPracticing,
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent! You completed all questions!",
            Self::Great => "Great job! You answered most questions!",
            Self::Good => "Good effort! Consider reviewing the missed questions.",
            Self::KeepPracticing => "Don't give up! Practice makes perfect.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewStatus {
    Skipped,
    /// Answered, correctness not yet known.
    Answered,
    Correct,
    Incorrect,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReviewEntryVm {
    pub number: usize,
    pub question_text: String,
    pub selected_text: Option<String>,
    pub correct_answer: Option<String>,
    pub explanation: Option<String>,
    pub status: ReviewStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResultsVm {
    pub quiz_title: String,
    pub answered: usize,
    pub total: usize,
    pub completion_percent: u32,
    pub tier: PerformanceTier,
    pub performance_message: &'static str,
    pub time_taken: String,

    pub score: Option<u32>,
    pub score_percentage: Option<f64>,
    pub submission_message: Option<String>,
    pub is_reconciled: bool,

    pub reviews: Vec<ReviewEntryVm>,
}

/// Project a session result for display. Server fields stay `None` until
/// reconciliation has been merged.
#[must_use]
pub fn present(result: &SessionResult) -> ResultsVm {
    let answered = result.answered_count();
    let total = result.total_questions();
    let completion_percent = completion_percent(answered, total);
    let tier = PerformanceTier::from_completion(completion_percent);

    let reviews = result
        .quiz()
        .questions()
        .iter()
        .enumerate()
        .map(|(index, question)| review_entry(result, index, question))
        .collect();

    ResultsVm {
        quiz_title: result.quiz().title().to_owned(),
        answered,
        total,
        completion_percent,
        tier,
        performance_message: tier.message(),
        time_taken: format_duration(result.elapsed_secs()),
        score: result.score(),
        score_percentage: result.percentage(),
        submission_message: result.submission_message().map(str::to_owned),
        is_reconciled: result.is_reconciled(),
        reviews,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn completion_percent(answered: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (answered as f64 / total as f64 * 100.0).round() as u32
}

fn review_entry(result: &SessionResult, index: usize, question: &Question) -> ReviewEntryVm {
    let local_selection = result
        .answers()
        .get(question.id())
        .map(|option| question.option(option).map_or_else(|| option.to_string(), str::to_owned));

    let (selected_text, correct_answer, explanation, status) =
        match result.reviewed_answer(question.id()) {
            Some(review) if review.correct_answer.is_some() => {
                let selected = review.submitted_answer.clone().or(local_selection);
                let status = match (&selected, review.is_correct()) {
                    (None, _) => ReviewStatus::Skipped,
                    (Some(_), true) => ReviewStatus::Correct,
                    (Some(_), false) => ReviewStatus::Incorrect,
                };
                (
                    selected,
                    review.correct_answer.clone(),
                    review.explanation.clone(),
                    status,
                )
            }
            review => {
                let status = if local_selection.is_some() {
                    ReviewStatus::Answered
                } else {
                    ReviewStatus::Skipped
                };
                let explanation = review.and_then(|r| r.explanation.clone());
                (local_selection, None, explanation, status)
            }
        };

    ReviewEntryVm {
        number: index + 1,
        question_text: question.text().to_owned(),
        selected_text,
        correct_answer,
        explanation,
        status,
    }
}
