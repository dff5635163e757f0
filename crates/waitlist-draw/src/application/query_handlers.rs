//! Query handlers for the Entrant Lifecycle & Draw context.
//!
//! Read-only view DTOs over the registry and the capacity tracker.

use serde::Serialize;
use uuid::Uuid;
use waitlist_core::entrant::{Entrant, EntrantStatus, StatusCounts};
use waitlist_core::error::DomainError;

use crate::application::capacity::CapacityTracker;
use crate::application::registry::EntrantRegistry;

/// Read-only view of one entrant.
#[derive(Debug, Serialize)]
pub struct EntrantView {
    /// The user identifier.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Contact email.
    pub user_email: String,
    /// Current status as a string.
    pub status: String,
}

impl From<Entrant> for EntrantView {
    fn from(entrant: Entrant) -> Self {
        Self {
            user_id: entrant.user_id,
            user_name: entrant.user_name,
            user_email: entrant.user_email,
            status: entrant.status.to_string(),
        }
    }
}

/// Read-only view of an event's seat accounting and entrant tallies.
#[derive(Debug, Serialize)]
pub struct CapacityView {
    /// The event identifier.
    pub event_id: Uuid,
    /// Fixed attendee limit.
    pub max_attendees: u32,
    /// Entrants currently selected or confirmed.
    pub current_attendees: u32,
    /// Seats still open.
    pub remaining: u32,
    /// Default draw size.
    pub sample_size: u32,
    /// Entrants per status.
    pub counts: StatusCounts,
}

/// Retrieves one entrant.
///
/// # Errors
///
/// Returns `DomainError::EntrantNotFound` if the user is not registered.
pub async fn get_entrant(
    event_id: Uuid,
    user_id: &str,
    registry: &EntrantRegistry,
) -> Result<EntrantView, DomainError> {
    registry.get(event_id, user_id).await.map(EntrantView::from)
}

/// Lists the event's entrants in `status`, sorted by user id.
///
/// # Errors
///
/// Returns `DomainError::Storage` if the store is unreachable.
pub async fn list_entrants(
    event_id: Uuid,
    status: EntrantStatus,
    registry: &EntrantRegistry,
) -> Result<Vec<EntrantView>, DomainError> {
    let mut entrants = registry.list_by_status(event_id, status).await?;
    entrants.sort_by(|a, b| a.user_id.cmp(&b.user_id));
    Ok(entrants.into_iter().map(EntrantView::from).collect())
}

/// Retrieves the event's capacity summary along with per-status tallies.
///
/// # Errors
///
/// Returns `DomainError::EventNotFound` if the event is unknown.
pub async fn get_capacity(
    event_id: Uuid,
    capacity: &CapacityTracker,
    registry: &EntrantRegistry,
) -> Result<CapacityView, DomainError> {
    let summary = capacity.snapshot(event_id).await?;
    let counts = registry.counts(event_id).await?;

    Ok(CapacityView {
        event_id,
        max_attendees: summary.capacity,
        current_attendees: summary.current_attendees,
        remaining: summary.remaining(),
        sample_size: summary.sample_size,
        counts,
    })
}
