use chrono::{DateTime, Utc};
use quiz_core::model::{Quiz, QuizAvailability};

use crate::vm::time_fmt::format_datetime;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizIntroVm {
    pub title: String,
    pub description: Option<String>,
    pub question_count: usize,
    pub time_per_question_label: String,
    pub availability: QuizAvailability,
    pub status_label: &'static str,
    /// Headline and detail shown when the quiz is not open.
    pub notice: Option<(&'static str, &'static str)>,
    pub starts_at_str: Option<String>,
    pub ends_at_str: Option<String>,
}

impl QuizIntroVm {
    /// Display-only; starting is not gated on availability.
    #[must_use]
    pub fn new(quiz: &Quiz, now: DateTime<Utc>) -> Self {
        let availability = quiz.availability(now);
        let window = quiz.window();
        let (status_label, notice) = match availability {
            QuizAvailability::Open => ("Active", None),
            QuizAvailability::Upcoming => (
                "Upcoming",
                Some((
                    "Quiz Not Started",
                    "This quiz will be available soon. Check back later!",
                )),
            ),
            QuizAvailability::Ended => (
                "Ended",
                Some(("Quiz Ended", "This quiz is no longer accepting submissions.")),
            ),
        };

        Self {
            title: quiz.title().to_owned(),
            description: quiz.description().map(str::to_owned),
            question_count: quiz.len(),
            time_per_question_label: time_per_question_label(quiz.time_per_question()),
            availability,
            status_label,
            notice,
            starts_at_str: window.starts_at().map(format_datetime),
            ends_at_str: window.ends_at().map(format_datetime),
        }
    }
}

#[must_use]
pub fn time_per_question_label(secs: u32) -> String {
    if secs == 0 {
        "Untimed".to_owned()
    } else {
        format!("{secs}s per question")
    }
}
