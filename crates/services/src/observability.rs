use std::sync::{Mutex, PoisonError};

use quiz_core::model::ParticipationId;

use crate::error::ReconcileError;
use crate::ports::ReconciliationObserver;

/// Default observer: one `warn!` event per failed reconciliation.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl ReconciliationObserver for TracingObserver {
    fn reconciliation_failed(&self, participation_id: &ParticipationId, error: &ReconcileError) {
        tracing::warn!(
            participation_id = %participation_id,
            error = %error,
            "submission reconciliation failed; keeping local result"
        );
    }
}

/// Observer that keeps failures in memory, for tests and diagnostics.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    failures: Mutex<Vec<(ParticipationId, String)>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded `(participation, error message)` pairs, oldest first.
    #[must_use]
    pub fn failures(&self) -> Vec<(ParticipationId, String)> {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ReconciliationObserver for RecordingObserver {
    fn reconciliation_failed(&self, participation_id: &ParticipationId, error: &ReconcileError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((participation_id.clone(), error.to_string()));
    }
}
