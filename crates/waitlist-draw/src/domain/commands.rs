//! Commands for the Entrant Lifecycle & Draw context.

use uuid::Uuid;
use waitlist_core::entrant::EntrantStatus;

/// An organizer or registration request, identified for logging.
pub trait Command: Send + Sync + std::fmt::Debug {
    /// Stable name used as the `command_type` log field.
    fn command_type(&self) -> &'static str;

    /// Correlation ID carried into every notification the command causes.
    fn correlation_id(&self) -> Uuid;
}

/// Command to open a new event waitlist.
#[derive(Debug, Clone)]
pub struct CreateEvent {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The new event's identifier.
    pub event_id: Uuid,
    /// Maximum number of admitted entrants.
    pub max_attendees: u32,
    /// Default draw size.
    pub sample_size: u32,
}

impl Command for CreateEvent {
    fn command_type(&self) -> &'static str {
        "waitlist.create_event"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to put a user on an event's waiting pool.
#[derive(Debug, Clone)]
pub struct RegisterEntrant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event identifier.
    pub event_id: Uuid,
    /// The registering user.
    pub user_id: String,
    /// The user's display name.
    pub user_name: String,
    /// The user's contact email.
    pub user_email: String,
}

impl Command for RegisterEntrant {
    fn command_type(&self) -> &'static str {
        "waitlist.register_entrant"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to run a draw over an event's waiting pool.
#[derive(Debug, Clone)]
pub struct DrawEntrants {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event identifier.
    pub event_id: Uuid,
    /// Number of entrants to promote; `None` uses the event's sample size.
    pub requested_size: Option<u32>,
}

impl Command for DrawEntrants {
    fn command_type(&self) -> &'static str {
        "waitlist.draw_entrants"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to move a set of entrants to a new status.
#[derive(Debug, Clone)]
pub struct TransitionEntrants {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The event identifier.
    pub event_id: Uuid,
    /// The entrants to move.
    pub user_ids: Vec<String>,
    /// The status to move them to.
    pub target: EntrantStatus,
}

impl Command for TransitionEntrants {
    fn command_type(&self) -> &'static str {
        "waitlist.transition_entrants"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
