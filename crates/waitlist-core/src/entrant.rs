//! Entrant records and per-event capacity summaries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Lifecycle status of an entrant within one event's waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntrantStatus {
    /// Registered and eligible for a draw.
    Waiting,
    /// Promoted by a draw; holds a seat.
    Selected,
    /// Accepted the invitation; holds a seat.
    Confirmed,
    /// Terminal tombstone. Never leaves this state.
    Cancelled,
}

impl EntrantStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Waiting,
        Self::Selected,
        Self::Confirmed,
        Self::Cancelled,
    ];

    /// Returns the storage/wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Selected => "selected",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether an entrant in this status occupies a seat.
    #[must_use]
    pub fn is_counted(self) -> bool {
        matches!(self, Self::Selected | Self::Confirmed)
    }

    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self == Self::Cancelled
    }
}

impl fmt::Display for EntrantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntrantStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(Self::Waiting),
            "selected" => Ok(Self::Selected),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(DomainError::Validation(format!(
                "unknown entrant status: {other}"
            ))),
        }
    }
}

/// A single registration on an event's waitlist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entrant {
    /// Identity of the registered user, unique within the event.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Contact email.
    pub user_email: String,
    /// Current lifecycle status.
    pub status: EntrantStatus,
}

impl Entrant {
    /// Creates a freshly registered entrant in the `waiting` status.
    #[must_use]
    pub fn waiting(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        user_email: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
            user_email: user_email.into(),
            status: EntrantStatus::Waiting,
        }
    }
}

/// Summary document for an event: its seat limit and current admissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCapacity {
    /// The event identifier.
    pub event_id: Uuid,
    /// Maximum number of admitted entrants, fixed at event creation.
    pub capacity: u32,
    /// Entrants currently in `selected` or `confirmed`.
    pub current_attendees: u32,
    /// Default draw size used when the organizer does not pick one.
    pub sample_size: u32,
}

impl EventCapacity {
    /// Seats still available for admission.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.current_attendees)
    }
}

/// Result of an atomic decrement of the attendee counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountChange {
    /// Counter value before the update.
    pub previous: u32,
    /// Counter value after the update.
    pub current: u32,
}

/// Per-status tallies for one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Entrants in `waiting`.
    pub waiting: u32,
    /// Entrants in `selected`.
    pub selected: u32,
    /// Entrants in `confirmed`.
    pub confirmed: u32,
    /// Entrants in `cancelled`.
    pub cancelled: u32,
}

impl StatusCounts {
    /// Adds one entrant with `status` to the tally.
    pub fn record(&mut self, status: EntrantStatus) {
        match status {
            EntrantStatus::Waiting => self.waiting += 1,
            EntrantStatus::Selected => self.selected += 1,
            EntrantStatus::Confirmed => self.confirmed += 1,
            EntrantStatus::Cancelled => self.cancelled += 1,
        }
    }

    /// The attendee count implied by entrant statuses.
    #[must_use]
    pub fn admitted(&self) -> u32 {
        self.selected + self.confirmed
    }
}
