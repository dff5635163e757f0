//! Persistence gateway abstraction.
//!
//! The backing store offers single-document atomic read-modify-write and no
//! cross-document transactions. Every method here touches exactly one
//! document, and every counter mutation is a single conditional update.

use async_trait::async_trait;
use uuid::Uuid;

use crate::entrant::{CountChange, Entrant, EntrantStatus, EventCapacity};
use crate::error::DomainError;

/// Outcome of a conditional entrant status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusWrite {
    /// The stored status matched `expected` and now holds the new status, or
    /// the same write had already been applied.
    Written,
    /// The stored status no longer matched `expected`; nothing was written.
    Conflict(EntrantStatus),
}

/// Document store the lifecycle components depend on.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Creates the summary document for a new event.
    async fn create_event(
        &self,
        event_id: Uuid,
        capacity: u32,
        sample_size: u32,
    ) -> Result<(), DomainError>;

    /// Loads the event's capacity summary.
    ///
    /// Returns `DomainError::EventNotFound` if the event has no summary.
    async fn get_capacity(&self, event_id: Uuid) -> Result<EventCapacity, DomainError>;

    /// Lists every entrant of the event currently in `status`.
    async fn fetch_entrants(
        &self,
        event_id: Uuid,
        status: EntrantStatus,
    ) -> Result<Vec<Entrant>, DomainError>;

    /// Lists every entrant of the event regardless of status.
    async fn fetch_all_entrants(&self, event_id: Uuid) -> Result<Vec<Entrant>, DomainError>;

    /// Loads one entrant, or `None` if the user is not registered.
    async fn fetch_entrant(
        &self,
        event_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Entrant>, DomainError>;

    /// Inserts a new entrant record.
    ///
    /// Returns `DomainError::AlreadyRegistered` if the user id is taken and
    /// `DomainError::EventNotFound` if the event does not exist.
    async fn insert_entrant(&self, event_id: Uuid, entrant: &Entrant) -> Result<(), DomainError>;

    /// Atomically adds `delta` to the attendee counter only if the result
    /// stays within `max_cap`. Returns the new count.
    ///
    /// Returns `DomainError::CapacityExceeded` and leaves the counter
    /// untouched otherwise.
    async fn conditional_increment_count(
        &self,
        event_id: Uuid,
        delta: u32,
        max_cap: u32,
    ) -> Result<u32, DomainError>;

    /// Atomically subtracts `delta` from the attendee counter, stopping at zero.
    async fn saturating_decrement_count(
        &self,
        event_id: Uuid,
        delta: u32,
    ) -> Result<CountChange, DomainError>;

    /// Writes `status` for the entrant only if its stored status equals
    /// `expected`, and records `write_id` alongside it.
    ///
    /// Replaying a write whose `write_id` already landed reports `Written`
    /// again instead of a conflict, so a retry after a lost reply cannot be
    /// mistaken for another session's change.
    ///
    /// Returns `DomainError::EntrantNotFound` if the entrant does not exist.
    async fn write_entrant_status(
        &self,
        event_id: Uuid,
        user_id: &str,
        expected: EntrantStatus,
        status: EntrantStatus,
        write_id: Uuid,
    ) -> Result<StatusWrite, DomainError>;
}
