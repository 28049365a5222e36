use quiz_core::model::{QuestionId, QuizId};
use services::InMemoryQuizBackend;
use services::ports::{QuestionRecord, QuizRecord};

const QUIZ_ID: &str = "rust-basics";

/// (question, options, correct option, explanation)
const QUESTIONS: [(&str, [&str; 3], &str, &str); 4] = [
    (
        "Which keyword makes a binding mutable?",
        ["mut", "var", "let"],
        "mut",
        "Bindings are immutable unless declared with `let mut`.",
    ),
    (
        "What does `?` do on an `Err` value?",
        ["Panics", "Returns it early", "Ignores it"],
        "Returns it early",
        "`?` converts the error with `From` and returns from the function.",
    ),
    (
        "Which type owns a growable UTF-8 string?",
        ["&str", "String", "char"],
        "String",
        "`&str` borrows; `String` owns its buffer.",
    ),
    (
        "Which trait allows `{}` formatting?",
        ["Debug", "Display", "ToOwned"],
        "Display",
        "`{:?}` uses `Debug`; `{}` uses `Display`.",
    ),
];

pub fn quiz_id() -> QuizId {
    QuizId::new(QUIZ_ID)
}

/// Offline backend preloaded with a short sample quiz and its answer key.
pub fn backend() -> InMemoryQuizBackend {
    let backend = InMemoryQuizBackend::new();
    let quiz_id = quiz_id();

    let questions = QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, (text, options, _, _))| QuestionRecord {
            id: QuestionId::new(format!("q{}", i + 1)),
            question_text: (*text).to_owned(),
            options: options.iter().map(|o| (*o).to_owned()).collect(),
            category: Some("rust".into()),
            difficulty: None,
        })
        .collect();

    backend.insert_quiz(QuizRecord {
        quiz_id: quiz_id.clone(),
        title: "Rust Basics".into(),
        description: Some("A short warm-up on everyday Rust.".into()),
        time_per_question: Some(20),
        start_time: None,
        end_time: None,
        questions,
    });

    for (i, (_, _, correct, explanation)) in QUESTIONS.iter().enumerate() {
        backend.set_answer(
            &quiz_id,
            &QuestionId::new(format!("q{}", i + 1)),
            *correct,
            Some(*explanation),
        );
    }
    backend
}
