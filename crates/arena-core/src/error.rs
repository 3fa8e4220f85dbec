//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An aggregate was not found.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// The operation is structurally forbidden in the entity's current state.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// The operation would violate a uniqueness or capacity invariant, or
    /// lost a race against another caller.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The expected version.
        expected: i64,
        /// The actual version found.
        actual: i64,
    },

    /// A validation error in command input.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for both business conflicts and lost store races.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            DomainError::Conflict(_) | DomainError::ConcurrencyConflict { .. }
        )
    }
}
