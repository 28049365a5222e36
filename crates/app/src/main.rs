mod demo;
mod terminal;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quiz_core::model::QuizId;
use services::ports::Credential;
use services::{
    ActiveSession, Clock, QuizApiConfig, QuizSessionService, RestQuizBackend, SessionSignal,
    StartError, StaticIdentity, TracingObserver,
};
use ui::vm::{PlayVm, QuizIntroVm, present};

use terminal::{HELP, PlayCommand, parse_command, render_intro, render_play, render_results};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingQuizId,
    UnknownArg(String),
    InvalidBaseUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingQuizId => write!(f, "play requires a quiz id"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBaseUrl { raw } => write!(f, "invalid --base-url value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app play <quiz-id> [--base-url <url>] [--token <token>] [--token-type <scheme>]");
    eprintln!("  app demo                                   # offline sample quiz");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_API_BASE_URL, QUIZ_API_TOKEN, QUIZ_API_TOKEN_TYPE, QUIZ_API_TIMEOUT_SECS");
    eprintln!("  RUST_LOG (default: warn)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Demo,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "demo" => Some(Self::Demo),
            _ => None,
        }
    }
}

struct PlayArgs {
    quiz_id: QuizId,
    config: QuizApiConfig,
}

impl PlayArgs {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        mut config: QuizApiConfig,
    ) -> Result<Self, ArgsError> {
        let mut quiz_id = None;
        let mut token = None;
        let mut token_type = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    let value = require_value(args, "--base-url")?;
                    config = config
                        .with_base_url(&value)
                        .map_err(|_| ArgsError::InvalidBaseUrl { raw: value })?;
                }
                "--token" => token = Some(require_value(args, "--token")?),
                "--token-type" => token_type = Some(require_value(args, "--token-type")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if quiz_id.is_none() => quiz_id = Some(QuizId::new(arg)),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        if let Some(token) = token {
            let scheme = token_type
                .or_else(|| config.credential.as_ref().map(|c| c.scheme().to_owned()))
                .unwrap_or_else(|| services::config::DEFAULT_TOKEN_TYPE.to_owned());
            config.credential = Some(Credential::new(scheme, token));
        }

        Ok(Self {
            quiz_id: quiz_id.ok_or(ArgsError::MissingQuizId)?,
            config,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next().as_deref() {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let (service, quiz_id) = match cmd {
        Command::Play => {
            let parsed = PlayArgs::parse(&mut argv, QuizApiConfig::from_env()?).map_err(|e| {
                eprintln!("{e}");
                print_usage();
                e
            })?;
            let backend = Arc::new(RestQuizBackend::new(&parsed.config)?);
            let service = QuizSessionService::from_backend(
                Clock::system(),
                Arc::new(StaticIdentity::new(parsed.config.credential.clone())),
                backend,
                Arc::new(TracingObserver),
            );
            (service, parsed.quiz_id)
        }
        Command::Demo => {
            if let Some(arg) = argv.next() {
                return Err(ArgsError::UnknownArg(arg).into());
            }
            let backend = Arc::new(demo::backend());
            let service = QuizSessionService::from_backend(
                Clock::system(),
                Arc::new(StaticIdentity::bearer("demo")),
                backend,
                Arc::new(TracingObserver),
            );
            (service, demo::quiz_id())
        }
    };

    tracing::debug!(%quiz_id, ?cmd, "starting play loop");
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    play_loop(&service, &quiz_id, &mut input).await
}

//
// ─── PLAY LOOP ─────────────────────────────────────────────────────────────────
//

type Input = Lines<BufReader<Stdin>>;

enum AttemptEnd {
    Submitted,
    Exited,
}

enum ResultsChoice {
    Retake,
    Quit,
}

/// Start, play, show results; repeat while the player retakes.
async fn play_loop(
    service: &QuizSessionService,
    quiz_id: &QuizId,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let cancel = CancellationToken::new();
        let session = match start_cancellable(service, quiz_id, &cancel, input).await? {
            Ok(session) => session,
            Err(StartError::Cancelled) => return Ok(()),
            Err(err) => {
                println!("Could not start the quiz: {err}");
                println!("r to try again, q to quit");
                if wait_for_retry(input).await? {
                    continue;
                }
                return Ok(());
            }
        };

        print!(
            "{}",
            render_intro(&QuizIntroVm::new(session.quiz(), Clock::system().now()))
        );
        println!("{HELP}");

        match play_attempt(&session, input).await? {
            AttemptEnd::Exited => return Ok(()),
            AttemptEnd::Submitted => match show_results(&session, input).await? {
                ResultsChoice::Retake => {}
                ResultsChoice::Quit => return Ok(()),
            },
        }
    }
}

/// Load the quiz while still listening for `q`, which cancels the load.
async fn start_cancellable(
    service: &QuizSessionService,
    quiz_id: &QuizId,
    cancel: &CancellationToken,
    input: &mut Input,
) -> std::io::Result<Result<ActiveSession, StartError>> {
    println!("Loading quiz {quiz_id}... (q to cancel)");
    let start = service.start(quiz_id, cancel);
    tokio::pin!(start);

    loop {
        tokio::select! {
            biased;
            started = &mut start => return Ok(started),
            line = input.next_line(), if !cancel.is_cancelled() => {
                let quit = match line? {
                    None => true,
                    Some(line) => parse_command(&line) == Ok(PlayCommand::Quit),
                };
                if quit {
                    cancel.cancel();
                }
            }
        }
    }
}

async fn wait_for_retry(input: &mut Input) -> std::io::Result<bool> {
    while let Some(line) = input.next_line().await? {
        match parse_command(&line) {
            Ok(PlayCommand::Retake) => return Ok(true),
            Ok(PlayCommand::Quit) => return Ok(false),
            _ => println!("r to try again, q to quit"),
        }
    }
    Ok(false)
}

async fn play_attempt(
    session: &ActiveSession,
    input: &mut Input,
) -> Result<AttemptEnd, Box<dyn std::error::Error>> {
    let mut signals = session.subscribe();
    let mut poll = tokio::time::interval(Duration::from_secs(1));
    let mut shown = render_current(session);

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    session.exit();
                    return Ok(AttemptEnd::Exited);
                };
                let command = match parse_command(&line) {
                    Ok(command) => command,
                    Err(err) => {
                        println!("{err}");
                        continue;
                    }
                };
                let outcome = match command {
                    PlayCommand::Select(number) => session.select_current(number - 1).map(|()| true),
                    PlayCommand::Next => session.go_next(),
                    PlayCommand::Previous => session.go_previous(),
                    PlayCommand::Jump(number) => session.jump_to(number - 1),
                    PlayCommand::Submit => {
                        session.submit();
                        return Ok(AttemptEnd::Submitted);
                    }
                    PlayCommand::Quit => {
                        session.exit();
                        return Ok(AttemptEnd::Exited);
                    }
                    PlayCommand::Retake | PlayCommand::Help => {
                        println!("{HELP}");
                        continue;
                    }
                };
                match outcome {
                    Ok(_) => shown = render_current(session),
                    Err(err) => println!("{err}"),
                }
            }
            changed = signals.changed() => {
                if changed.is_ok() && *signals.borrow_and_update() == SessionSignal::Submitted {
                    println!("\nTime is up.");
                    return Ok(AttemptEnd::Submitted);
                }
            }
            _ = poll.tick() => {
                if session.snapshot().progress.current_index != shown {
                    shown = render_current(session);
                }
            }
        }
    }
}

/// Print the play screen and return the question index it shows.
fn render_current(session: &ActiveSession) -> usize {
    let snapshot = session.snapshot();
    print!("{}", render_play(&PlayVm::from(&snapshot)));
    snapshot.progress.current_index
}

async fn show_results(
    session: &ActiveSession,
    input: &mut Input,
) -> Result<ResultsChoice, Box<dyn std::error::Error>> {
    let mut signals = session.subscribe();
    let mut watching = true;
    let print_results = || {
        if let Some(result) = session.result() {
            print!("{}", render_results(&present(&result)));
        }
        println!("r to retake, q to quit");
    };
    print_results();

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else {
                    return Ok(ResultsChoice::Quit);
                };
                match parse_command(&line) {
                    Ok(PlayCommand::Retake) => return Ok(ResultsChoice::Retake),
                    Ok(PlayCommand::Quit) => return Ok(ResultsChoice::Quit),
                    _ => println!("r to retake, q to quit"),
                }
            }
            changed = signals.changed(), if watching => {
                if changed.is_err() {
                    watching = false;
                } else if *signals.borrow_and_update() == SessionSignal::Reconciled {
                    print_results();
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
