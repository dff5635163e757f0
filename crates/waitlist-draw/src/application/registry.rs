//! Read access to an event's entrants, plus the registration write path.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;
use waitlist_core::entrant::{Entrant, EntrantStatus, StatusCounts};
use waitlist_core::error::DomainError;
use waitlist_core::gateway::PersistenceGateway;

/// Holds the entrant records of each event, keyed by user id.
///
/// Status changes never go through the registry; `StatusTransition` is the
/// single writer of entrant statuses.
#[derive(Clone)]
pub struct EntrantRegistry {
    gateway: Arc<dyn PersistenceGateway>,
}

impl EntrantRegistry {
    /// Creates a registry over `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Lists the event's entrants in `status`. Order carries no meaning.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` if the store is unreachable.
    pub async fn list_by_status(
        &self,
        event_id: Uuid,
        status: EntrantStatus,
    ) -> Result<Vec<Entrant>, DomainError> {
        self.gateway.fetch_entrants(event_id, status).await
    }

    /// Loads one entrant.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EntrantNotFound` if the user is not registered.
    pub async fn get(&self, event_id: Uuid, user_id: &str) -> Result<Entrant, DomainError> {
        self.gateway
            .fetch_entrant(event_id, user_id)
            .await?
            .ok_or_else(|| DomainError::EntrantNotFound {
                event_id,
                user_id: user_id.to_owned(),
            })
    }

    /// Tallies the event's entrants by status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Storage` if the store is unreachable.
    pub async fn counts(&self, event_id: Uuid) -> Result<StatusCounts, DomainError> {
        let mut counts = StatusCounts::default();
        for entrant in self.gateway.fetch_all_entrants(event_id).await? {
            counts.record(entrant.status);
        }
        Ok(counts)
    }

    /// Adds a user to the event's waiting pool.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank user id,
    /// `DomainError::EventNotFound` for an unknown event and
    /// `DomainError::AlreadyRegistered` if the user is already on the list.
    #[instrument(skip(self, user_name, user_email))]
    pub async fn register(
        &self,
        event_id: Uuid,
        user_id: &str,
        user_name: &str,
        user_email: &str,
    ) -> Result<Entrant, DomainError> {
        if user_id.trim().is_empty() {
            return Err(DomainError::Validation("user_id must not be blank".to_owned()));
        }
        let entrant = Entrant::waiting(user_id, user_name, user_email);
        self.gateway.insert_entrant(event_id, &entrant).await?;
        info!("entrant registered");
        Ok(entrant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waitlist_test_support::{FailingGateway, InMemoryGateway};

    fn registry_with(gateway: &Arc<InMemoryGateway>) -> EntrantRegistry {
        EntrantRegistry::new(gateway.clone())
    }

    #[tokio::test]
    async fn test_list_by_status_filters_pool() {
        let gateway = Arc::new(InMemoryGateway::new());
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 10, 1, 2);
        gateway.seed_waiting_pool(event_id, 3);
        gateway.seed_entrant(
            event_id,
            Entrant {
                status: EntrantStatus::Selected,
                ..Entrant::waiting("picked", "Picked", "p@example.com")
            },
        );

        let registry = registry_with(&gateway);
        let waiting = registry
            .list_by_status(event_id, EntrantStatus::Waiting)
            .await
            .unwrap();
        let selected = registry
            .list_by_status(event_id, EntrantStatus::Selected)
            .await
            .unwrap();

        assert_eq!(waiting.len(), 3);
        assert!(waiting.iter().all(|e| e.status == EntrantStatus::Waiting));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].user_id, "picked");
    }

    #[tokio::test]
    async fn test_get_unknown_entrant_returns_not_found() {
        let gateway = Arc::new(InMemoryGateway::new());
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 10, 0, 2);

        let err = registry_with(&gateway)
            .get(event_id, "ghost")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::EntrantNotFound { user_id, .. } if user_id == "ghost"));
    }

    #[tokio::test]
    async fn test_register_creates_waiting_entrant_once() {
        let gateway = Arc::new(InMemoryGateway::new());
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 10, 0, 2);
        let registry = registry_with(&gateway);

        let entrant = registry
            .register(event_id, "u-1", "Ada", "ada@example.com")
            .await
            .unwrap();
        assert_eq!(entrant.status, EntrantStatus::Waiting);

        let duplicate = registry
            .register(event_id, "u-1", "Ada again", "ada@example.com")
            .await
            .unwrap_err();
        assert!(matches!(duplicate, DomainError::AlreadyRegistered { .. }));
        assert_eq!(registry.get(event_id, "u-1").await.unwrap().user_name, "Ada");
    }

    #[tokio::test]
    async fn test_register_rejects_blank_user_and_unknown_event() {
        let gateway = Arc::new(InMemoryGateway::new());
        let registry = registry_with(&gateway);

        let blank = registry
            .register(Uuid::new_v4(), "  ", "x", "x@example.com")
            .await
            .unwrap_err();
        assert!(matches!(blank, DomainError::Validation(_)));

        let unknown = registry
            .register(Uuid::new_v4(), "u-1", "x", "x@example.com")
            .await
            .unwrap_err();
        assert!(matches!(unknown, DomainError::EventNotFound(_)));
    }

    #[tokio::test]
    async fn test_counts_tally_every_status() {
        let gateway = Arc::new(InMemoryGateway::new());
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 10, 0, 2);
        gateway.seed_waiting_pool(event_id, 2);
        gateway.seed_entrant(
            event_id,
            Entrant {
                status: EntrantStatus::Cancelled,
                ..Entrant::waiting("gone", "Gone", "g@example.com")
            },
        );

        let counts = registry_with(&gateway).counts(event_id).await.unwrap();

        assert_eq!(counts.waiting, 2);
        assert_eq!(counts.cancelled, 1);
        assert_eq!(counts.admitted(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_storage_error() {
        let registry = EntrantRegistry::new(Arc::new(FailingGateway));

        let err = registry
            .list_by_status(Uuid::new_v4(), EntrantStatus::Waiting)
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Storage(_)));
    }
}
