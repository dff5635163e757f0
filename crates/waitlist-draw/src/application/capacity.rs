//! Seat accounting for an event.

use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;
use waitlist_core::entrant::EventCapacity;
use waitlist_core::error::DomainError;
use waitlist_core::gateway::PersistenceGateway;

/// Owns the attendee counter of each event and arbitrates admission.
///
/// The counter is only ever moved with the store's atomic conditional update,
/// never with a read followed by a write, so concurrent draws for the same
/// event cannot jointly overshoot the limit.
#[derive(Clone)]
pub struct CapacityTracker {
    gateway: Arc<dyn PersistenceGateway>,
}

impl CapacityTracker {
    /// Creates a tracker over `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// The event's capacity summary.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` if the event is unknown.
    pub async fn snapshot(&self, event_id: Uuid) -> Result<EventCapacity, DomainError> {
        self.gateway.get_capacity(event_id).await
    }

    /// Seats still open: `capacity - current_attendees`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` if the event is unknown.
    pub async fn remaining(&self, event_id: Uuid) -> Result<u32, DomainError> {
        Ok(self.snapshot(event_id).await?.remaining())
    }

    /// Admits `delta` more attendees, returning the new count.
    ///
    /// The limit is read first because it is fixed at event creation; the
    /// counter itself is checked and moved in one conditional update.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::CapacityExceeded` if the event cannot take
    /// `delta` more attendees. Nothing is written in that case.
    #[instrument(skip(self))]
    pub async fn reserve(&self, event_id: Uuid, delta: u32) -> Result<u32, DomainError> {
        let summary = self.snapshot(event_id).await?;
        if delta == 0 {
            return Ok(summary.current_attendees);
        }
        let count = self
            .gateway
            .conditional_increment_count(event_id, delta, summary.capacity)
            .await?;
        debug!(count, capacity = summary.capacity, "seats reserved");
        Ok(count)
    }

    /// Frees `delta` seats, returning the new count. The counter never goes
    /// below zero.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EventNotFound` if the event is unknown.
    #[instrument(skip(self))]
    pub async fn release(&self, event_id: Uuid, delta: u32) -> Result<u32, DomainError> {
        if delta == 0 {
            return Ok(self.snapshot(event_id).await?.current_attendees);
        }
        let change = self
            .gateway
            .saturating_decrement_count(event_id, delta)
            .await?;
        if change.previous < delta {
            warn!(
                previous = change.previous,
                delta, "release would drive attendee count below zero; clamped"
            );
        }
        debug!(count = change.current, "seats released");
        Ok(change.current)
    }
}
