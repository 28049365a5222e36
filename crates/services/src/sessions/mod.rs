mod loader;
mod progress;
mod reconciler;
mod state;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use loader::{LoadedSession, SessionLoader};
pub use progress::{SessionProgress, SessionSnapshot};
pub use reconciler::{Reconciler, build_submission};
pub use state::{QuizSession, SessionStatus, TickOutcome};
pub use workflow::{ActiveSession, QuizSessionService, SessionSignal};
