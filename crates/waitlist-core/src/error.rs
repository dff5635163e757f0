//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

use crate::entrant::EntrantStatus;

/// Top-level domain error type.
#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// No summary document exists for the event.
    #[error("event not found: {0}")]
    EventNotFound(Uuid),

    /// The user is not registered on the event's waitlist.
    #[error("entrant {user_id} not found on event {event_id}")]
    EntrantNotFound {
        /// The event that was searched.
        event_id: Uuid,
        /// The missing user.
        user_id: String,
    },

    /// The user already holds a registration for the event.
    #[error("entrant {user_id} is already registered on event {event_id}")]
    AlreadyRegistered {
        /// The event being registered for.
        event_id: Uuid,
        /// The duplicate user.
        user_id: String,
    },

    /// Admission refused: the event has no room for the requested seats.
    #[error("capacity exceeded on event {event_id}: requested {requested}, remaining {remaining}")]
    CapacityExceeded {
        /// The event that is full.
        event_id: Uuid,
        /// Seats requested.
        requested: u32,
        /// Seats still available when the request was refused.
        remaining: u32,
    },

    /// The requested status change is not an edge of the lifecycle.
    #[error("illegal transition for entrant {user_id}: {from} -> {to}")]
    IllegalTransition {
        /// The entrant whose change was refused.
        user_id: String,
        /// Status at the time of the request.
        from: EntrantStatus,
        /// Status that was requested.
        to: EntrantStatus,
    },

    /// Malformed input.
    #[error("validation error: {0}")]
    Validation(String),

    /// A store/infrastructure failure that survived the retry policy.
    #[error("storage error: {0}")]
    Storage(String),

    /// A local failure unrelated to the store (poisoned lock, panicked task).
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    /// Whether the failure is transient and worth retrying at the store layer.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
