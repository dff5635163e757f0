//! Partitioned results of batch transitions and draws.

use serde::Serialize;
use uuid::Uuid;
use waitlist_core::error::DomainError;

/// One entrant whose transition did not complete.
#[derive(Debug, Clone)]
pub struct FailedTransition {
    /// The entrant that failed.
    pub user_id: String,
    /// Why it failed.
    pub reason: DomainError,
}

impl Serialize for FailedTransition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("FailedTransition", 2)?;
        state.serialize_field("user_id", &self.user_id)?;
        state.serialize_field("reason", &self.reason.to_string())?;
        state.end()
    }
}

/// Partition of a batch into entrants that reached the target and those that
/// did not. Successes are never rolled back; re-running the batch on
/// `failed_user_ids()` is safe.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    /// Entrants now holding the target status.
    pub succeeded: Vec<String>,
    /// Entrants that did not reach the target, with reasons.
    pub failed: Vec<FailedTransition>,
}

impl BatchOutcome {
    /// Whether some but not all entrants failed.
    #[must_use]
    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty() && !self.succeeded.is_empty()
    }

    /// Ids to resubmit.
    #[must_use]
    pub fn failed_user_ids(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.user_id.clone()).collect()
    }
}

/// Result of a draw handed back to the organizer.
#[derive(Debug, Clone, Serialize)]
pub struct DrawResult {
    /// The event drawn from.
    pub event_id: Uuid,
    /// Number of entrants the draw tried to promote.
    pub effective_size: u32,
    /// Entrants promoted to `selected`.
    pub selected_user_ids: Vec<String>,
    /// Entrants picked by the draw whose transition failed.
    pub failed: Vec<FailedTransition>,
}

impl DrawResult {
    /// A draw that promoted nobody.
    #[must_use]
    pub fn empty(event_id: Uuid) -> Self {
        Self {
            event_id,
            effective_size: 0,
            selected_user_ids: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// Ids picked by the draw that should be retried.
    #[must_use]
    pub fn failed_user_ids(&self) -> Vec<String> {
        self.failed.iter().map(|f| f.user_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_failure_requires_both_sides() {
        let mut outcome = BatchOutcome {
            succeeded: vec!["a".to_owned()],
            failed: Vec::new(),
        };
        assert!(!outcome.is_partial_failure());

        outcome.failed.push(FailedTransition {
            user_id: "b".to_owned(),
            reason: DomainError::Storage("timeout".to_owned()),
        });
        assert!(outcome.is_partial_failure());
        assert_eq!(outcome.failed_user_ids(), vec!["b".to_owned()]);
    }

    #[test]
    fn test_failed_transition_serializes_reason_as_message() {
        let failed = FailedTransition {
            user_id: "b".to_owned(),
            reason: DomainError::Storage("timeout".to_owned()),
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["user_id"], "b");
        assert_eq!(json["reason"], "storage error: timeout");
    }
}
