use services::SessionSnapshot;

use crate::vm::time_fmt::format_countdown;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigatorEntryVm {
    pub number: usize,
    pub is_current: bool,
    pub is_answered: bool,
}

/// Everything the play screen renders for the current question.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayVm {
    pub quiz_title: String,
    pub position_label: String,
    pub progress_percent: u32,
    pub question_text: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub options: Vec<String>,
    pub selected_option: Option<usize>,
    pub countdown: Option<String>,
    pub answered: usize,
    pub total: usize,
    pub is_first: bool,
    pub is_last: bool,
    pub navigator: Vec<NavigatorEntryVm>,
}

impl From<&SessionSnapshot> for PlayVm {
    fn from(snapshot: &SessionSnapshot) -> Self {
        let quiz = &snapshot.quiz;
        let index = snapshot.progress.current_index;
        let total = quiz.len();
        let question = &quiz.questions()[index];

        let navigator = quiz
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| NavigatorEntryVm {
                number: i + 1,
                is_current: i == index,
                is_answered: snapshot.answers.is_answered(q.id()),
            })
            .collect();

        Self {
            quiz_title: quiz.title().to_owned(),
            position_label: format!("Question {} of {}", index + 1, total),
            progress_percent: position_percent(index, total),
            question_text: question.text().to_owned(),
            category: question.category().map(str::to_owned),
            difficulty: question.difficulty().map(str::to_owned),
            options: question.options().to_vec(),
            selected_option: snapshot.answers.get(question.id()),
            countdown: snapshot.progress.remaining_secs.map(format_countdown),
            answered: snapshot.progress.answered,
            total,
            is_first: index == 0,
            is_last: index + 1 == total,
            navigator,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn position_percent(index: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((index + 1) as f64 / total as f64 * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{AttemptId, ParticipationId, Question, QuestionId, Quiz, QuizId};
    use quiz_core::time::fixed_now;
    use services::QuizSession;
    use services::session::LoadedSession;
    use std::sync::Arc;

    fn session(time_per_question: u32) -> QuizSession {
        let questions = (1..=3)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    vec!["yes".into(), "no".into()],
                )
                .unwrap()
                .with_category(Some("general".into()))
            })
            .collect();
        let loaded = LoadedSession {
            attempt_id: AttemptId::generate(),
            quiz: Arc::new(Quiz::new(QuizId::new("quiz"), "Play", questions, time_per_question).unwrap()),
            participation_id: ParticipationId::new("p-1"),
        };
        QuizSession::new(&loaded, fixed_now())
    }

    #[test]
    fn first_question_of_timed_quiz() {
        let vm = PlayVm::from(&session(75).snapshot());

        assert_eq!(vm.position_label, "Question 1 of 3");
        assert_eq!(vm.progress_percent, 33);
        assert_eq!(vm.countdown.as_deref(), Some("1:15"));
        assert_eq!(vm.category.as_deref(), Some("general"));
        assert_eq!(vm.options, vec!["yes", "no"]);
        assert!(vm.is_first);
        assert!(!vm.is_last);
        assert_eq!(vm.selected_option, None);
    }

    #[test]
    fn navigator_tracks_answers_and_cursor() {
        let mut session = session(0);
        session.select_current(1).unwrap();
        session.jump_to(2).unwrap();

        let vm = PlayVm::from(&session.snapshot());

        assert_eq!(vm.countdown, None);
        assert_eq!(vm.progress_percent, 100);
        assert!(vm.is_last);
        assert_eq!(vm.answered, 1);
        assert_eq!(
            vm.navigator,
            vec![
                NavigatorEntryVm { number: 1, is_current: false, is_answered: true },
                NavigatorEntryVm { number: 2, is_current: false, is_answered: false },
                NavigatorEntryVm { number: 3, is_current: true, is_answered: false },
            ]
        );
    }
}
