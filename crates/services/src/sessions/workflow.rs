use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tokio_util::sync::CancellationToken;

use quiz_core::model::{
    AttemptId, ParticipationId, QuestionId, Quiz, QuizId, ScorePatch, SessionResult,
};

use crate::Clock;
use crate::error::{SessionError, StartError};
use crate::ports::{IdentityProvider, QuizContentService, ReconciliationObserver, SubmissionService};
use super::loader::{LoadedSession, SessionLoader};
use super::progress::SessionSnapshot;
use super::reconciler::Reconciler;
use super::state::{QuizSession, SessionStatus, TickOutcome};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Coarse session change notifications for shells that re-render on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionSignal {
    Active,
    Submitted,
    /// Server score merged into the result.
    Reconciled,
    Exited,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Starts quiz sessions: loads content, then hands back a running session.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    loader: SessionLoader,
    reconciler: Reconciler,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(clock: Clock, loader: SessionLoader, reconciler: Reconciler) -> Self {
        Self {
            clock,
            loader,
            reconciler,
        }
    }

    /// Wire a service around one backend that serves both content and submissions.
    #[must_use]
    pub fn from_backend<B>(
        clock: Clock,
        identity: Arc<dyn IdentityProvider>,
        backend: Arc<B>,
        observer: Arc<dyn ReconciliationObserver>,
    ) -> Self
    where
        B: QuizContentService + SubmissionService + 'static,
    {
        let content: Arc<dyn QuizContentService> = backend.clone();
        let submissions: Arc<dyn SubmissionService> = backend;
        Self::new(
            clock,
            SessionLoader::new(Arc::clone(&identity), content),
            Reconciler::new(identity, submissions, observer),
        )
    }

    /// Load `quiz_id` and start a session on its first question.
    ///
    /// Call again for a retake; every call opens a new participation.
    ///
    /// # Errors
    ///
    /// Returns `StartError::Cancelled` if `cancel` fires before loading
    /// completes, otherwise whatever loading failed with.
    pub async fn start(
        &self,
        quiz_id: &QuizId,
        cancel: &CancellationToken,
    ) -> Result<ActiveSession, StartError> {
        let loaded = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::info!(%quiz_id, "session load cancelled");
                return Err(StartError::Cancelled);
            }
            loaded = self.loader.load_session(quiz_id) => loaded?,
        };
        Ok(ActiveSession::spawn(
            &loaded,
            self.clock.now(),
            self.reconciler.clone(),
            CancellationToken::new(),
        ))
    }
}

//
// ─── ACTIVE SESSION ────────────────────────────────────────────────────────────
//

struct TimerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

struct SharedState {
    session: QuizSession,
    result: Option<SessionResult>,
    timer: Option<TimerHandle>,
    timer_epoch: u64,
}

struct SessionCore {
    state: Mutex<SharedState>,
    reconciler: Reconciler,
    signal: watch::Sender<SessionSignal>,
    teardown: CancellationToken,
    started_at: DateTime<Utc>,
    origin: Instant,
}

/// A running quiz attempt with its countdown timer.
///
/// Dropping the handle exits the session.
pub struct ActiveSession {
    core: Arc<SessionCore>,
    attempt_id: AttemptId,
    quiz: Arc<Quiz>,
    participation_id: ParticipationId,
}

impl ActiveSession {
    fn spawn(
        loaded: &LoadedSession,
        started_at: DateTime<Utc>,
        reconciler: Reconciler,
        teardown: CancellationToken,
    ) -> Self {
        let (signal, _) = watch::channel(SessionSignal::Active);
        let core = Arc::new(SessionCore {
            state: Mutex::new(SharedState {
                session: QuizSession::new(loaded, started_at),
                result: None,
                timer: None,
                timer_epoch: 0,
            }),
            reconciler,
            signal,
            teardown,
            started_at,
            origin: Instant::now(),
        });
        {
            let mut state = core.lock();
            core.restart_timer(&mut state);
        }
        tracing::info!(
            attempt_id = %loaded.attempt_id,
            participation_id = %loaded.participation_id,
            "quiz session started"
        );
        Self {
            core,
            attempt_id: loaded.attempt_id,
            quiz: Arc::clone(&loaded.quiz),
            participation_id: loaded.participation_id.clone(),
        }
    }

    #[must_use]
    pub fn attempt_id(&self) -> AttemptId {
        self.attempt_id
    }

    #[must_use]
    pub fn quiz(&self) -> &Arc<Quiz> {
        &self.quiz
    }

    #[must_use]
    pub fn participation_id(&self) -> &ParticipationId {
        &self.participation_id
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.lock().session.snapshot()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.core.lock().session.status()
    }

    /// # Errors
    ///
    /// See `QuizSession::select_answer`.
    pub fn select_answer(
        &self,
        question_id: &QuestionId,
        option_index: usize,
    ) -> Result<(), SessionError> {
        self.core
            .lock()
            .session
            .select_answer(question_id, option_index)
    }

    /// # Errors
    ///
    /// See `QuizSession::select_answer`.
    pub fn select_current(&self, option_index: usize) -> Result<(), SessionError> {
        self.core.lock().session.select_current(option_index)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotActive` once submitted or exited.
    pub fn go_next(&self) -> Result<bool, SessionError> {
        self.navigate(QuizSession::go_next)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotActive` once submitted or exited.
    pub fn go_previous(&self) -> Result<bool, SessionError> {
        self.navigate(QuizSession::go_previous)
    }

    /// # Errors
    ///
    /// Returns `SessionError::NotActive` once submitted or exited and
    /// `SessionError::IndexOutOfRange` for an index past the end.
    pub fn jump_to(&self, index: usize) -> Result<bool, SessionError> {
        self.navigate(|session| session.jump_to(index))
    }

    /// Submit now. The local result comes back immediately; the server score
    /// is merged later and announced as `SessionSignal::Reconciled`.
    ///
    /// Returns `None` if the session was already submitted or exited.
    pub fn submit(&self) -> Option<SessionResult> {
        let mut state = self.core.lock();
        let result = state.session.submit(self.core.now())?;
        self.core.finish_submission(&mut state, result.clone());
        Some(result)
    }

    /// Latest result, including any merged server fields.
    #[must_use]
    pub fn result(&self) -> Option<SessionResult> {
        self.core.lock().result.clone()
    }

    /// Tear down: stop the timer, freeze state, ignore late reconciliation.
    pub fn exit(&self) {
        self.core.exit();
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSignal> {
        self.core.signal.subscribe()
    }

    #[must_use]
    pub fn has_live_timer(&self) -> bool {
        self.core
            .lock()
            .timer
            .as_ref()
            .is_some_and(|timer| !timer.task.is_finished())
    }

    fn navigate(
        &self,
        step: impl FnOnce(&mut QuizSession) -> Result<bool, SessionError>,
    ) -> Result<bool, SessionError> {
        let mut state = self.core.lock();
        let moved = step(&mut state.session)?;
        if moved {
            self.core.restart_timer(&mut state);
        }
        Ok(moved)
    }
}

impl Drop for ActiveSession {
    fn drop(&mut self) {
        self.core.exit();
    }
}

impl std::fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveSession")
            .field("attempt_id", &self.attempt_id)
            .field("participation_id", &self.participation_id)
            .finish_non_exhaustive()
    }
}

//
// ─── CORE ──────────────────────────────────────────────────────────────────────
//

impl SessionCore {
    fn lock(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.started_at + elapsed
    }

    fn stop_timer(state: &mut SharedState) {
        state.timer_epoch += 1;
        if let Some(timer) = state.timer.take() {
            timer.token.cancel();
        }
    }

    fn restart_timer(self: &Arc<Self>, state: &mut SharedState) {
        Self::stop_timer(state);
        if !state.session.is_active() || state.session.remaining_secs().is_none() {
            return;
        }
        let epoch = state.timer_epoch;
        let token = self.teardown.child_token();
        let first_tick = Instant::now() + TICK_PERIOD;
        let task = tokio::spawn(run_timer(Arc::downgrade(self), epoch, first_tick, token.clone()));
        state.timer = Some(TimerHandle { token, task });
    }

    /// Apply one tick from the timer tagged `epoch`. Returns `false` when
    /// that timer should stop.
    fn on_tick(self: &Arc<Self>, epoch: u64) -> bool {
        let mut state = self.lock();
        if state.timer_epoch != epoch {
            return false;
        }
        match state.session.tick(self.now()) {
            TickOutcome::Idle => false,
            TickOutcome::Counting { .. } => true,
            TickOutcome::Advanced { index } => {
                tracing::debug!(index, "question timed out; advancing");
                true
            }
            TickOutcome::Submitted(result) => {
                tracing::info!(
                    participation_id = %result.participation_id(),
                    "last question timed out; submitting"
                );
                self.finish_submission(&mut state, result);
                false
            }
        }
    }

    fn finish_submission(self: &Arc<Self>, state: &mut SharedState, result: SessionResult) {
        Self::stop_timer(state);
        tracing::info!(
            participation_id = %result.participation_id(),
            answered = result.answered_count(),
            total = result.total_questions(),
            elapsed_secs = result.elapsed_secs(),
            "quiz submitted"
        );

        let participation_id = result.participation_id().clone();
        let answers = result.answers().clone();
        let quiz = Arc::clone(result.quiz());
        state.result = Some(result);
        self.signal.send_replace(SessionSignal::Submitted);

        let core = Arc::clone(self);
        tokio::spawn(async move {
            let patch = core
                .reconciler
                .reconcile(&participation_id, &answers, &quiz)
                .await;
            core.apply_patch(patch);
        });
    }

    fn apply_patch(&self, patch: Option<ScorePatch>) {
        let Some(patch) = patch else {
            return;
        };
        let mut state = self.lock();
        if state.session.status() == SessionStatus::Exited {
            tracing::debug!("session exited before reconciliation finished; discarding");
            return;
        }
        if let Some(result) = state.result.as_mut() {
            result.merge(patch);
            if result.is_reconciled() {
                self.signal.send_replace(SessionSignal::Reconciled);
            }
        }
    }

    fn exit(&self) {
        let mut state = self.lock();
        if state.session.status() == SessionStatus::Exited {
            return;
        }
        state.session.exit();
        Self::stop_timer(&mut state);
        self.teardown.cancel();
        self.signal.send_replace(SessionSignal::Exited);
        tracing::debug!("quiz session exited");
    }
}

async fn run_timer(
    core: Weak<SessionCore>,
    epoch: u64,
    first_tick: Instant,
    token: CancellationToken,
) {
    let mut ticks = interval_at(first_tick, TICK_PERIOD);
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticks.tick() => {}
        }
        let Some(core) = core.upgrade() else {
            break;
        };
        if !core.on_tick(epoch) {
            break;
        }
    }
}
