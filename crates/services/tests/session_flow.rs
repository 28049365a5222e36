use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use quiz_core::model::{QuestionId, QuizId};
use quiz_core::time::fixed_now;
use services::in_memory::BackendCall;
use services::ports::{QuestionRecord, QuizRecord, SubmissionReceipt, SubmittedAnswer};
use services::{
    ActiveSession, Clock, InMemoryQuizBackend, QuizSessionService, RecordingObserver,
    SessionError, SessionSignal, SessionStatus, StartError, StaticIdentity,
};

struct Fixture {
    backend: Arc<InMemoryQuizBackend>,
    observer: Arc<RecordingObserver>,
    service: QuizSessionService,
}

impl Fixture {
    fn new(time_per_question: Option<u32>, questions: usize) -> Self {
        let backend = Arc::new(InMemoryQuizBackend::new());
        let quiz_id = QuizId::new("quiz");
        backend.insert_quiz(QuizRecord {
            quiz_id: quiz_id.clone(),
            title: "Session Flow".into(),
            description: None,
            time_per_question,
            start_time: None,
            end_time: None,
            questions: (1..=questions)
                .map(|i| QuestionRecord {
                    id: QuestionId::new(format!("q{i}")),
                    question_text: format!("Question {i}"),
                    options: vec!["a".into(), "b".into(), "c".into()],
                    category: None,
                    difficulty: None,
                })
                .collect(),
        });
        backend.set_answer(&quiz_id, &QuestionId::new("q1"), "a", Some("a it is"));
        for i in 2..=questions {
            backend.set_answer(&quiz_id, &QuestionId::new(format!("q{i}")), "b", None);
        }

        let observer = Arc::new(RecordingObserver::new());
        let service = QuizSessionService::from_backend(
            Clock::fixed(fixed_now()),
            Arc::new(StaticIdentity::bearer("token")),
            Arc::clone(&backend),
            observer.clone(),
        );
        Self {
            backend,
            observer,
            service,
        }
    }

    async fn start(&self) -> ActiveSession {
        self.service
            .start(&QuizId::new("quiz"), &CancellationToken::new())
            .await
            .unwrap()
    }
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value)
}

#[tokio::test(start_paused = true)]
async fn timed_quiz_advances_and_auto_submits() {
    let fx = Fixture::new(Some(10), 3);
    let session = fx.start().await;
    let mut signals = session.subscribe();

    sleep(secs(2.5)).await;
    session.select_current(0).unwrap();
    assert!(session.go_next().unwrap());

    // Q2 expires unanswered 10s after the manual move.
    sleep(secs(11.5)).await;
    let snapshot = session.snapshot();
    assert_eq!(snapshot.progress.current_index, 2);
    assert_eq!(snapshot.progress.remaining_secs, Some(9));

    sleep(secs(1.0)).await;
    session.select_current(1).unwrap();

    sleep(secs(10.0)).await;
    assert_eq!(session.status(), SessionStatus::Submitted);
    assert!(!session.has_live_timer());

    signals
        .wait_for(|signal| *signal == SessionSignal::Reconciled)
        .await
        .unwrap();
    let result = session.result().unwrap();
    assert_eq!(result.elapsed_secs(), 22);
    assert_eq!(result.answered_count(), 2);
    assert_eq!(result.total_questions(), 3);
    assert_eq!(result.score(), Some(2));
    assert_eq!(result.answers().get(&QuestionId::new("q1")), Some(0));
    assert_eq!(result.answers().get(&QuestionId::new("q2")), None);
    assert_eq!(result.answers().get(&QuestionId::new("q3")), Some(1));

    let submissions = fx.backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(
        submissions[0].1,
        vec![
            SubmittedAnswer {
                question_id: QuestionId::new("q1"),
                selected_option: "a".into(),
            },
            SubmittedAnswer {
                question_id: QuestionId::new("q3"),
                selected_option: "b".into(),
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn manual_navigation_restarts_full_countdown() {
    let fx = Fixture::new(Some(10), 3);
    let session = fx.start().await;

    sleep(secs(4.5)).await;
    assert_eq!(session.snapshot().progress.remaining_secs, Some(6));

    assert!(session.go_next().unwrap());
    assert_eq!(session.snapshot().progress.remaining_secs, Some(10));

    // The superseded timer would have ticked at t=5.
    sleep(secs(0.7)).await;
    assert_eq!(session.snapshot().progress.remaining_secs, Some(10));

    sleep(secs(0.6)).await;
    assert_eq!(session.snapshot().progress.remaining_secs, Some(9));
}

#[tokio::test(start_paused = true)]
async fn submit_is_idempotent() {
    let fx = Fixture::new(Some(10), 2);
    let session = fx.start().await;
    session.select_current(1).unwrap();

    let first = session.submit();
    let second = session.submit();
    sleep(secs(1.0)).await;

    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(fx.backend.submission_count(), 1);
    assert_eq!(
        session.select_current(0),
        Err(SessionError::NotActive)
    );
}

#[tokio::test(start_paused = true)]
async fn failed_reconciliation_keeps_local_result() {
    let fx = Fixture::new(None, 2);
    let session = fx.start().await;
    fx.backend.fail_submissions(StatusCode::INTERNAL_SERVER_ERROR);
    session.select_current(1).unwrap();

    let local = session.submit().unwrap();
    sleep(secs(1.0)).await;

    let result = session.result().unwrap();
    assert_eq!(session.status(), SessionStatus::Submitted);
    assert_eq!(result, local);
    assert_eq!(result.score(), None);
    assert_eq!(result.answered_count(), 1);

    let failures = fx.observer.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(&failures[0].0, session.participation_id());
}

#[tokio::test(start_paused = true)]
async fn blank_receipt_leaves_score_pending() {
    let fx = Fixture::new(None, 2);
    let session = fx.start().await;
    let mut signals = session.subscribe();
    fx.backend
        .reply_to_submissions(SubmissionReceipt::with_message("   "));
    session.select_current(0).unwrap();

    session.submit().unwrap();
    sleep(secs(1.0)).await;

    assert_eq!(fx.backend.submission_count(), 1);
    assert_eq!(*signals.borrow_and_update(), SessionSignal::Submitted);
    let result = session.result().unwrap();
    assert_eq!(result.submission_message(), None);
    assert!(!result.is_reconciled());
    assert!(fx.observer.failures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn jump_restarts_full_countdown() {
    let fx = Fixture::new(Some(10), 3);
    let session = fx.start().await;

    sleep(secs(3.5)).await;
    assert_eq!(session.snapshot().progress.remaining_secs, Some(7));

    assert!(session.jump_to(2).unwrap());
    let progress = session.snapshot().progress;
    assert_eq!(progress.current_index, 2);
    assert_eq!(progress.remaining_secs, Some(10));

    // Jumping to the current question is not a move.
    assert!(!session.jump_to(2).unwrap());

    sleep(secs(0.7)).await;
    assert_eq!(session.snapshot().progress.remaining_secs, Some(10));

    sleep(secs(0.6)).await;
    assert_eq!(session.snapshot().progress.remaining_secs, Some(9));
    assert_eq!(
        session.jump_to(3),
        Err(SessionError::IndexOutOfRange { index: 3, len: 3 })
    );
}

#[tokio::test(start_paused = true)]
async fn submit_does_not_wait_for_backend() {
    let fx = Fixture::new(None, 2);
    let session = fx.start().await;
    let mut signals = session.subscribe();
    fx.backend.hold_calls();

    let local = session.submit().unwrap();
    assert_eq!(local.score(), None);
    assert_eq!(*signals.borrow_and_update(), SessionSignal::Submitted);

    sleep(secs(5.0)).await;
    assert!(!session.result().unwrap().is_reconciled());

    fx.backend.release_calls();
    signals
        .wait_for(|signal| *signal == SessionSignal::Reconciled)
        .await
        .unwrap();

    let result = session.result().unwrap();
    assert_eq!(result.score(), Some(0));
    assert_eq!(result.percentage(), Some(0.0));
    assert_eq!(result.submission_message(), Some("Quiz submitted"));
}

#[tokio::test(start_paused = true)]
async fn cancel_during_load_returns_cancelled() {
    let fx = Fixture::new(Some(10), 2);
    fx.backend.hold_calls();
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        sleep(secs(1.0)).await;
        canceller.cancel();
    });

    let err = fx
        .service
        .start(&QuizId::new("quiz"), &token)
        .await
        .unwrap_err();

    assert!(matches!(err, StartError::Cancelled));
    assert_eq!(
        fx.backend.calls(),
        vec![BackendCall::CreateParticipation(QuizId::new("quiz"))]
    );
}

#[tokio::test(start_paused = true)]
async fn exit_stops_timer_and_freezes_state() {
    let fx = Fixture::new(Some(10), 3);
    let session = fx.start().await;
    session.select_current(2).unwrap();

    sleep(secs(3.5)).await;
    session.exit();
    let frozen = session.snapshot();

    sleep(secs(60.0)).await;
    assert_eq!(session.snapshot(), frozen);
    assert_eq!(session.status(), SessionStatus::Exited);
    assert!(!session.has_live_timer());
    assert!(session.submit().is_none());
    assert_eq!(session.jump_to(1), Err(SessionError::NotActive));
    assert_eq!(fx.backend.submission_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn exit_after_submit_discards_late_reconciliation() {
    let fx = Fixture::new(None, 2);
    let session = fx.start().await;
    session.select_current(1).unwrap();
    fx.backend.hold_calls();

    session.submit().unwrap();
    session.exit();
    fx.backend.release_calls();
    sleep(secs(1.0)).await;

    let result = session.result().unwrap();
    assert!(!result.is_reconciled());
    assert_eq!(result.score(), None);
    assert_eq!(session.status(), SessionStatus::Exited);
}

#[tokio::test(start_paused = true)]
async fn retake_opens_a_new_participation() {
    let fx = Fixture::new(None, 2);
    let first = fx.start().await;
    first.submit().unwrap();
    let second = fx.start().await;

    assert_ne!(first.participation_id(), second.participation_id());
    assert_ne!(first.attempt_id(), second.attempt_id());
    assert_eq!(second.status(), SessionStatus::Active);
    assert!(second.snapshot().answers.is_empty());
}
