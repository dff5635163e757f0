//! Command handlers for the Entrant Lifecycle & Draw context.
//!
//! Each handler validates its command, logs it under its correlation ID and
//! delegates to the lifecycle component that owns the write.

use tracing::info;
use waitlist_core::entrant::Entrant;
use waitlist_core::error::DomainError;
use waitlist_core::gateway::PersistenceGateway;

use crate::application::draw::DrawEngine;
use crate::application::registry::EntrantRegistry;
use crate::application::transition::StatusTransition;
use crate::domain::commands::{Command, CreateEvent, DrawEntrants, RegisterEntrant, TransitionEntrants};
use crate::domain::outcomes::{BatchOutcome, DrawResult};

/// Handles the `CreateEvent` command: validates limits and stores the summary.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a zero capacity or sample size, and
/// `DomainError::Storage` if the summary could not be written.
pub async fn handle_create_event(
    command: &CreateEvent,
    gateway: &dyn PersistenceGateway,
) -> Result<(), DomainError> {
    if command.max_attendees == 0 {
        return Err(DomainError::Validation(
            "max_attendees must be at least 1".to_owned(),
        ));
    }
    if command.sample_size == 0 {
        return Err(DomainError::Validation(
            "sample_size must be at least 1".to_owned(),
        ));
    }

    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
        max_attendees = command.max_attendees,
        sample_size = command.sample_size,
        "handling command"
    );

    gateway
        .create_event(command.event_id, command.max_attendees, command.sample_size)
        .await
}

/// Handles the `RegisterEntrant` command: adds the user to the waiting pool.
///
/// # Errors
///
/// Returns `DomainError` if validation fails, the event is unknown or the
/// user is already registered.
pub async fn handle_register_entrant(
    command: &RegisterEntrant,
    registry: &EntrantRegistry,
) -> Result<Entrant, DomainError> {
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
        user_id = %command.user_id,
        "handling command"
    );

    registry
        .register(
            command.event_id,
            &command.user_id,
            &command.user_name,
            &command.user_email,
        )
        .await
}

/// Handles the `DrawEntrants` command, falling back to the event's sample
/// size when no size was requested.
///
/// # Errors
///
/// Returns `DomainError` as described on [`DrawEngine::draw`].
pub async fn handle_draw_entrants(
    command: &DrawEntrants,
    engine: &DrawEngine,
) -> Result<DrawResult, DomainError> {
    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
        requested_size = ?command.requested_size,
        "handling command"
    );

    match command.requested_size {
        Some(size) => {
            engine
                .draw(command.event_id, size, command.correlation_id)
                .await
        }
        None => {
            engine
                .draw_default(command.event_id, command.correlation_id)
                .await
        }
    }
}

/// Handles the `TransitionEntrants` command: applies the target status to
/// each listed entrant independently.
///
/// # Errors
///
/// Returns `DomainError::Validation` if no user ids were given. Per-entrant
/// failures are reported inside the returned `BatchOutcome`.
pub async fn handle_transition_entrants(
    command: &TransitionEntrants,
    transition: &StatusTransition,
) -> Result<BatchOutcome, DomainError> {
    if command.user_ids.is_empty() {
        return Err(DomainError::Validation(
            "user_ids must not be empty".to_owned(),
        ));
    }

    info!(
        command_type = command.command_type(),
        correlation_id = %command.correlation_id(),
        event_id = %command.event_id,
        target = %command.target,
        count = command.user_ids.len(),
        "handling command"
    );

    Ok(transition
        .apply_batch(
            command.event_id,
            &command.user_ids,
            command.target,
            command.correlation_id,
        )
        .await)
}
