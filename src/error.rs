use thiserror::Error;

use crate::{
    dao::{api::error::ApiError, storage::StorageError},
    state::{
        AbortError, ApplyError, PlanError,
        ledger::LedgerError,
        promotion::PromotionError,
        state_machine::SessionPhase,
    },
};

/// Errors surfaced to the referee while operating a scoring session.
///
/// None of them is fatal: the session keeps its state and the operator may
/// retry or go back to the súmula list.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Points were assigned before the round timer reached zero.
    #[error("wait for the round timer to finish before assigning points")]
    TimerNotCompleted,
    /// The ledger refused the mutation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// The promotion toggle referenced an unknown player.
    #[error(transparent)]
    Promotion(#[from] PromotionError),
    /// Operation cannot be performed in the current phase.
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// Submission attempted without confirming the final scores.
    #[error("confirm the final scores before submitting")]
    NotConfirmed,
    /// A submission is already in flight.
    #[error("a submission is already in progress")]
    SubmissionInFlight,
    /// The backend did not accept the tally.
    #[error("failed to submit súmula")]
    Submission(#[source] ApiError),
    /// Local slot storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors raised by the súmula listing and claim operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The backend call failed.
    #[error(transparent)]
    Api(#[from] ApiError),
    /// Local slot storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The súmula could not be encoded for the local slot.
    #[error("failed to encode súmula `{id}`")]
    Encode {
        /// Súmula being stored.
        id: i64,
        /// Serializer error.
        #[source]
        source: serde_json::Error,
    },
    /// Requested súmula is not among the active ones.
    #[error("not found: {0}")]
    NotFound(String),
    /// Another súmula is still being scored; leave or submit it first.
    #[error("súmula `{0}` is still open; leave or submit it first")]
    SessionActive(i64),
}

impl From<PlanError> for SessionError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::AlreadyPending => SessionError::SubmissionInFlight,
            PlanError::InvalidTransition(invalid) => {
                SessionError::InvalidState(invalid.to_string())
            }
        }
    }
}

impl From<ApplyError> for SessionError {
    fn from(err: ApplyError) -> Self {
        match err {
            ApplyError::NoPending => SessionError::InvalidState("no transition is pending".into()),
            ApplyError::IdMismatch { .. } => {
                SessionError::InvalidState("pending transition does not match".into())
            }
            ApplyError::PhaseMismatch { expected, actual } => SessionError::InvalidState(format!(
                "state changed during transition (expected {expected:?}, got {actual:?})"
            )),
        }
    }
}

impl From<AbortError> for SessionError {
    fn from(err: AbortError) -> Self {
        match err {
            AbortError::NoPending => SessionError::InvalidState("no pending transition".into()),
            AbortError::IdMismatch { .. } => {
                SessionError::InvalidState("transition plan does not match".into())
            }
        }
    }
}

impl SessionError {
    pub(crate) fn wrong_phase(action: &str, phase: SessionPhase) -> Self {
        SessionError::InvalidState(format!("cannot {action} while in {phase:?}"))
    }
}
