//! Entrant status state machine.
//!
//! ```text
//! waiting ──► selected ──► confirmed
//!    │            │            │
//!    └────────────┴────────────┴──► cancelled (terminal)
//! ```

use waitlist_core::entrant::EntrantStatus;
use waitlist_core::error::DomainError;

/// How a transition moves the attendee counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityEffect {
    /// The entrant starts occupying a seat.
    Reserve,
    /// The entrant gives up its seat.
    Release,
    /// Seat occupancy is unchanged.
    Unchanged,
}

/// What applying a target status to an entrant requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPlan {
    /// The entrant already holds the target status.
    AlreadyInStatus,
    /// A legal move with the given counter effect.
    Move(CapacityEffect),
}

/// Whether `from -> to` is an edge of the lifecycle.
#[must_use]
pub fn is_legal_edge(from: EntrantStatus, to: EntrantStatus) -> bool {
    use EntrantStatus::{Cancelled, Confirmed, Selected, Waiting};

    matches!(
        (from, to),
        (Waiting, Selected | Cancelled) | (Selected, Confirmed | Cancelled) | (Confirmed, Cancelled)
    )
}

/// Counter effect of moving from `from` to `to`.
#[must_use]
pub fn capacity_effect(from: EntrantStatus, to: EntrantStatus) -> CapacityEffect {
    match (from.is_counted(), to.is_counted()) {
        (false, true) => CapacityEffect::Reserve,
        (true, false) => CapacityEffect::Release,
        _ => CapacityEffect::Unchanged,
    }
}

/// Decides how to bring `user_id` from `current` to `target`.
///
/// # Errors
///
/// Returns `DomainError::IllegalTransition` if the edge is not in the lifecycle.
pub fn plan(
    user_id: &str,
    current: EntrantStatus,
    target: EntrantStatus,
) -> Result<TransitionPlan, DomainError> {
    if current == target {
        return Ok(TransitionPlan::AlreadyInStatus);
    }
    if !is_legal_edge(current, target) {
        return Err(DomainError::IllegalTransition {
            user_id: user_id.to_owned(),
            from: current,
            to: target,
        });
    }
    Ok(TransitionPlan::Move(capacity_effect(current, target)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use EntrantStatus::{Cancelled, Confirmed, Selected, Waiting};

    #[test]
    fn test_exactly_five_edges_are_legal() {
        let legal: Vec<_> = EntrantStatus::ALL
            .iter()
            .flat_map(|&from| EntrantStatus::ALL.iter().map(move |&to| (from, to)))
            .filter(|&(from, to)| is_legal_edge(from, to))
            .collect();

        assert_eq!(
            legal,
            vec![
                (Waiting, Selected),
                (Waiting, Cancelled),
                (Selected, Confirmed),
                (Selected, Cancelled),
                (Confirmed, Cancelled),
            ]
        );
    }

    #[test]
    fn test_no_edge_leads_back_to_waiting() {
        for from in EntrantStatus::ALL {
            assert!(!is_legal_edge(from, Waiting));
        }
    }

    #[test]
    fn test_cancelled_is_terminal() {
        for to in [Waiting, Selected, Confirmed] {
            let err = plan("u", Cancelled, to).unwrap_err();
            assert!(matches!(
                err,
                DomainError::IllegalTransition { from: Cancelled, .. }
            ));
        }
    }

    #[test]
    fn test_same_status_is_noop_even_for_terminal() {
        assert_eq!(
            plan("u", Cancelled, Cancelled).unwrap(),
            TransitionPlan::AlreadyInStatus
        );
        assert_eq!(
            plan("u", Selected, Selected).unwrap(),
            TransitionPlan::AlreadyInStatus
        );
    }

    #[test]
    fn test_capacity_effects_follow_seat_occupancy() {
        assert_eq!(capacity_effect(Waiting, Selected), CapacityEffect::Reserve);
        assert_eq!(capacity_effect(Selected, Confirmed), CapacityEffect::Unchanged);
        assert_eq!(capacity_effect(Selected, Cancelled), CapacityEffect::Release);
        assert_eq!(capacity_effect(Confirmed, Cancelled), CapacityEffect::Release);
        assert_eq!(capacity_effect(Waiting, Cancelled), CapacityEffect::Unchanged);
    }

    #[test]
    fn test_skipping_selection_is_illegal() {
        let err = plan("u-9", Waiting, Confirmed).unwrap_err();
        match err {
            DomainError::IllegalTransition { user_id, from, to } => {
                assert_eq!(user_id, "u-9");
                assert_eq!(from, Waiting);
                assert_eq!(to, Confirmed);
            }
            other => panic!("expected IllegalTransition, got {other:?}"),
        }
    }
}
