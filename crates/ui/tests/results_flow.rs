use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use quiz_core::model::{QuestionId, QuizId};
use quiz_core::time::fixed_now;
use services::ports::{QuestionRecord, QuizRecord};
use services::{Clock, InMemoryQuizBackend, QuizSessionService, RecordingObserver, StaticIdentity};
use ui::vm::{PerformanceTier, PlayVm, ReviewStatus, present};

fn service(backend: &Arc<InMemoryQuizBackend>) -> QuizSessionService {
    backend.insert_quiz(QuizRecord {
        quiz_id: QuizId::new("quiz"),
        title: "Results".into(),
        description: None,
        time_per_question: Some(10),
        start_time: None,
        end_time: None,
        questions: (1..=3)
            .map(|i| QuestionRecord {
                id: QuestionId::new(format!("q{i}")),
                question_text: format!("Question {i}"),
                options: vec!["left".into(), "right".into()],
                category: None,
                difficulty: None,
            })
            .collect(),
    });
    QuizSessionService::from_backend(
        Clock::fixed(fixed_now()),
        Arc::new(StaticIdentity::bearer("token")),
        Arc::clone(backend),
        Arc::new(RecordingObserver::new()),
    )
}

#[tokio::test(start_paused = true)]
async fn results_render_when_submission_service_is_down() {
    let backend = Arc::new(InMemoryQuizBackend::new());
    let service = service(&backend);
    backend.fail_submissions(StatusCode::SERVICE_UNAVAILABLE);

    let session = service
        .start(&QuizId::new("quiz"), &CancellationToken::new())
        .await
        .unwrap();
    session.select_current(1).unwrap();
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(PlayVm::from(&session.snapshot()).countdown.as_deref(), Some("0:06"));

    session.submit().unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let vm = present(&session.result().unwrap());
    assert_eq!(vm.answered, 1);
    assert_eq!(vm.total, 3);
    assert_eq!(vm.completion_percent, 33);
    assert_eq!(vm.tier, PerformanceTier::KeepPracticing);
    assert_eq!(vm.time_taken, "4s");
    assert_eq!(vm.score, None);
    assert!(!vm.is_reconciled);
    assert_eq!(vm.reviews[0].status, ReviewStatus::Answered);
    assert_eq!(vm.reviews[0].selected_text.as_deref(), Some("right"));
}

#[tokio::test(start_paused = true)]
async fn results_upgrade_after_reconciliation() {
    let backend = Arc::new(InMemoryQuizBackend::new());
    let service = service(&backend);
    backend.set_answer(&QuizId::new("quiz"), &QuestionId::new("q1"), "right", None);
    backend.set_answer(&QuizId::new("quiz"), &QuestionId::new("q2"), "left", Some("left wins"));

    let session = service
        .start(&QuizId::new("quiz"), &CancellationToken::new())
        .await
        .unwrap();
    let mut signals = session.subscribe();
    session.select_current(1).unwrap();
    session.go_next().unwrap();
    session.select_current(1).unwrap();
    session.submit().unwrap();

    signals
        .wait_for(|signal| *signal == services::SessionSignal::Reconciled)
        .await
        .unwrap();

    let vm = present(&session.result().unwrap());
    assert_eq!(vm.score, Some(1));
    assert!(vm.is_reconciled);
    let statuses: Vec<_> = vm.reviews.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![ReviewStatus::Correct, ReviewStatus::Incorrect, ReviewStatus::Skipped]
    );
    assert_eq!(vm.reviews[1].explanation.as_deref(), Some("left wins"));
}
