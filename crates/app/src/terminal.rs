use std::fmt::{self, Write as _};

use ui::vm::{PlayVm, QuizIntroVm, ResultsVm, ReviewStatus};

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayCommand {
    /// 1-based option number.
    Select(usize),
    Next,
    Previous,
    /// 1-based question number.
    Jump(usize),
    Submit,
    Quit,
    Retake,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    InvalidNumber(String),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => write!(f, "type a command (h for help)"),
            CommandError::Unknown(raw) => write!(f, "unknown command: {raw}"),
            CommandError::InvalidNumber(raw) => write!(f, "not a question number: {raw}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
  1-9      select an option
  n / p    next / previous question
  j <k>    jump to question k
  s        submit
  q        quit
  r        retake (from results)";

/// # Errors
///
/// Returns `CommandError` for blank, unknown or malformed input.
pub fn parse_command(line: &str) -> Result<PlayCommand, CommandError> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err(CommandError::Empty);
    };

    match head {
        "n" | "next" => Ok(PlayCommand::Next),
        "p" | "prev" => Ok(PlayCommand::Previous),
        "s" | "submit" => Ok(PlayCommand::Submit),
        "q" | "quit" => Ok(PlayCommand::Quit),
        "r" | "retake" => Ok(PlayCommand::Retake),
        "h" | "help" | "?" => Ok(PlayCommand::Help),
        "j" | "jump" => {
            let raw = parts.next().unwrap_or_default();
            match raw.parse::<usize>() {
                Ok(number) if number > 0 => Ok(PlayCommand::Jump(number)),
                _ => Err(CommandError::InvalidNumber(raw.to_owned())),
            }
        }
        digit if digit.len() == 1 => match digit.parse::<usize>() {
            Ok(number) if number > 0 => Ok(PlayCommand::Select(number)),
            _ => Err(CommandError::Unknown(digit.to_owned())),
        },
        other => Err(CommandError::Unknown(other.to_owned())),
    }
}

//
// ─── RENDERING ─────────────────────────────────────────────────────────────────
//

#[must_use]
pub fn render_intro(vm: &QuizIntroVm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} [{}] ==", vm.title, vm.status_label);
    if let Some(description) = &vm.description {
        let _ = writeln!(out, "{description}");
    }
    let _ = writeln!(
        out,
        "{} questions, {}",
        vm.question_count, vm.time_per_question_label
    );
    if let Some((headline, detail)) = vm.notice {
        let _ = writeln!(out, "! {headline}: {detail}");
    }
    out
}

#[must_use]
pub fn render_play(vm: &PlayVm) -> String {
    let mut out = String::new();
    let _ = write!(out, "\n{} ({}%)", vm.position_label, vm.progress_percent);
    if let Some(countdown) = &vm.countdown {
        let _ = write!(out, "  time left {countdown}");
    }
    let _ = writeln!(out, "  answered {}/{}", vm.answered, vm.total);

    let navigator: Vec<String> = vm
        .navigator
        .iter()
        .map(|entry| match (entry.is_current, entry.is_answered) {
            (true, _) => format!("[{}]", entry.number),
            (false, true) => format!("*{}", entry.number),
            (false, false) => entry.number.to_string(),
        })
        .collect();
    let _ = writeln!(out, "{}", navigator.join(" "));

    let _ = writeln!(out, "{}", vm.question_text);
    for (index, option) in vm.options.iter().enumerate() {
        let marker = if vm.selected_option == Some(index) { ">" } else { " " };
        let _ = writeln!(out, "{marker} {}. {option}", index + 1);
    }
    out
}

#[must_use]
pub fn render_results(vm: &ResultsVm) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== Quiz completed: {} ==", vm.quiz_title);
    let _ = writeln!(out, "{}", vm.performance_message);
    if let Some(message) = &vm.submission_message {
        let _ = writeln!(out, "{message}");
    }
    match (vm.score, vm.score_percentage) {
        (Some(score), Some(percentage)) => {
            let _ = writeln!(out, "Score: {score} ({percentage:.0}%)");
        }
        (Some(score), None) => {
            let _ = writeln!(out, "Score: {score}");
        }
        _ if !vm.is_reconciled => {
            let _ = writeln!(out, "Score: pending");
        }
        _ => {}
    }
    let _ = writeln!(
        out,
        "Answered {}/{} ({}%) in {}",
        vm.answered, vm.total, vm.completion_percent, vm.time_taken
    );

    for review in &vm.reviews {
        let status = match review.status {
            ReviewStatus::Skipped => "skipped",
            ReviewStatus::Answered => "answered",
            ReviewStatus::Correct => "correct",
            ReviewStatus::Incorrect => "incorrect",
        };
        let _ = writeln!(
            out,
            "{:>3}. {} [{status}]",
            review.number, review.question_text
        );
        if let Some(selected) = &review.selected_text {
            let _ = writeln!(out, "     your answer: {selected}");
        }
        if review.status == ReviewStatus::Incorrect {
            if let Some(correct) = &review.correct_answer {
                let _ = writeln!(out, "     correct: {correct}");
            }
        }
        if let Some(explanation) = &review.explanation {
            let _ = writeln!(out, "     {explanation}");
        }
    }
    out
}
