#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod identity;
pub mod in_memory;
pub mod observability;
pub mod ports;
pub mod rest_backend;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use config::QuizApiConfig;
pub use error::{BackendError, ConfigError, LoadStage, ReconcileError, SessionError, StartError};
pub use identity::StaticIdentity;
pub use in_memory::InMemoryQuizBackend;
pub use observability::{RecordingObserver, TracingObserver};
pub use rest_backend::RestQuizBackend;

pub use sessions::{
    ActiveSession, QuizSession, QuizSessionService, SessionProgress, SessionSignal,
    SessionSnapshot, SessionStatus,
};
