//! The single writer of entrant statuses.
//!
//! Each transition claims a seat before writing the status and gives seats
//! back only after the write has landed, so the counter never drops below the
//! number of counted entrants. The status write is a compare-and-set on the
//! status it was planned from. If another session moved the entrant in
//! between, any claimed seat is returned and the transition is re-planned from
//! the status actually stored.

use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use waitlist_core::entrant::{Entrant, EntrantStatus};
use waitlist_core::error::DomainError;
use waitlist_core::event::{
    Clock, EventMetadata, STATUS_CHANGED_EVENT_TYPE, StatusChanged, StatusChangedEvent,
    StatusNotifier,
};
use waitlist_core::gateway::{PersistenceGateway, StatusWrite};

use crate::application::capacity::CapacityTracker;
use crate::domain::lifecycle::{self, CapacityEffect, TransitionPlan};
use crate::domain::outcomes::{BatchOutcome, FailedTransition};

/// The lifecycle only moves forward, so an entrant can be moved under us at
/// most three times before every plan resolves.
const MAX_PLAN_ROUNDS: usize = 4;

/// Result of a single successful `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status was written.
    Applied {
        /// Status before the write.
        from: EntrantStatus,
        /// Status after the write.
        to: EntrantStatus,
    },
    /// The entrant already held the target status; nothing was written.
    Unchanged,
}

/// Applies legal status changes and keeps the seat counter in step with them.
#[derive(Clone)]
pub struct StatusTransition {
    gateway: Arc<dyn PersistenceGateway>,
    capacity: CapacityTracker,
    notifier: Arc<dyn StatusNotifier>,
    clock: Arc<dyn Clock>,
}

impl StatusTransition {
    /// Creates the state machine over `gateway`, reporting selections to
    /// `notifier`.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        notifier: Arc<dyn StatusNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            capacity: CapacityTracker::new(gateway.clone()),
            gateway,
            notifier,
            clock,
        }
    }

    /// Moves one entrant to `target`.
    ///
    /// Re-applying a status the entrant already holds succeeds without
    /// writing, so retried batches are safe.
    ///
    /// # Errors
    ///
    /// - `DomainError::EntrantNotFound` if the user is not registered.
    /// - `DomainError::IllegalTransition` if the edge is not in the lifecycle.
    /// - `DomainError::CapacityExceeded` if admitting the entrant would
    ///   overshoot the event's limit.
    /// - `DomainError::Storage` if the store failed. A seat claimed for this
    ///   attempt has been returned. If the status was written but its seat
    ///   could not be released, the counter stays one too high.
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        event_id: Uuid,
        user_id: &str,
        target: EntrantStatus,
        correlation_id: Uuid,
    ) -> Result<TransitionOutcome, DomainError> {
        let mut entrant = self
            .gateway
            .fetch_entrant(event_id, user_id)
            .await?
            .ok_or_else(|| DomainError::EntrantNotFound {
                event_id,
                user_id: user_id.to_owned(),
            })?;

        for _ in 0..MAX_PLAN_ROUNDS {
            let from = entrant.status;
            let effect = match lifecycle::plan(user_id, from, target)? {
                TransitionPlan::AlreadyInStatus => return Ok(TransitionOutcome::Unchanged),
                TransitionPlan::Move(effect) => effect,
            };

            if effect == CapacityEffect::Reserve {
                self.capacity.reserve(event_id, 1).await?;
            }

            // Fresh per attempt; a retried write with the same id is
            // reported as written rather than as a conflict.
            let write_id = Uuid::new_v4();
            match self
                .gateway
                .write_entrant_status(event_id, user_id, from, target, write_id)
                .await
            {
                Ok(StatusWrite::Written) => {
                    info!(%from, to = %target, "entrant status changed");
                    if effect == CapacityEffect::Release {
                        self.release_written(event_id, user_id, target).await?;
                    }
                    if target == EntrantStatus::Selected {
                        self.announce(event_id, &entrant, target, correlation_id)
                            .await;
                    }
                    return Ok(TransitionOutcome::Applied { from, to: target });
                }
                Ok(StatusWrite::Conflict(actual)) => {
                    warn!(expected = %from, %actual, "entrant moved concurrently; re-planning");
                    self.return_claim(event_id, effect).await?;
                    entrant.status = actual;
                }
                Err(err) => {
                    if let Err(undo_err) = self.return_claim(event_id, effect).await {
                        error!(
                            error = %err,
                            undo_error = %undo_err,
                            "status write failed and claimed seat could not be returned"
                        );
                    }
                    return Err(err);
                }
            }
        }

        Err(DomainError::Internal(format!(
            "entrant {user_id} kept changing while moving to {target}"
        )))
    }

    /// Applies `target` to each id independently and partitions the results.
    ///
    /// Every member runs as its own task; successes are never rolled back.
    /// Tasks keep running to completion even if the returned future is
    /// dropped, so no write is abandoned half-way.
    pub async fn apply_batch(
        &self,
        event_id: Uuid,
        user_ids: &[String],
        target: EntrantStatus,
        correlation_id: Uuid,
    ) -> BatchOutcome {
        let mut seen = std::collections::HashSet::new();
        let handles: Vec<_> = user_ids
            .iter()
            .filter(|id| seen.insert(*id))
            .map(|user_id| {
                let this = self.clone();
                let owned_id = user_id.clone();
                let handle = tokio::spawn(async move {
                    this.apply(event_id, &owned_id, target, correlation_id)
                        .await
                });
                (user_id.clone(), handle)
            })
            .collect();

        let mut outcome = BatchOutcome::default();
        for (user_id, handle) in handles {
            match handle.await {
                Ok(Ok(_)) => outcome.succeeded.push(user_id),
                Ok(Err(reason)) => outcome.failed.push(FailedTransition { user_id, reason }),
                Err(join_err) => outcome.failed.push(FailedTransition {
                    user_id,
                    reason: DomainError::Internal(format!("transition task failed: {join_err}")),
                }),
            }
        }

        if !outcome.failed.is_empty() {
            warn!(
                %event_id,
                succeeded = outcome.succeeded.len(),
                failed = outcome.failed.len(),
                "batch transition finished with failures"
            );
        }
        outcome
    }

    /// Gives back the seat reserved for a status write that did not land.
    async fn return_claim(
        &self,
        event_id: Uuid,
        effect: CapacityEffect,
    ) -> Result<(), DomainError> {
        if effect == CapacityEffect::Reserve {
            self.capacity.release(event_id, 1).await?;
        }
        Ok(())
    }

    async fn release_written(
        &self,
        event_id: Uuid,
        user_id: &str,
        status: EntrantStatus,
    ) -> Result<(), DomainError> {
        self.capacity
            .release(event_id, 1)
            .await
            .map(drop)
            .inspect_err(|err| {
                error!(
                    %user_id,
                    %status,
                    error = %err,
                    "status written but seat not released"
                );
            })
    }

    async fn announce(
        &self,
        event_id: Uuid,
        entrant: &Entrant,
        status: EntrantStatus,
        correlation_id: Uuid,
    ) {
        let event = StatusChangedEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: STATUS_CHANGED_EVENT_TYPE.to_owned(),
                waitlist_id: event_id,
                correlation_id,
                occurred_at: self.clock.now(),
            },
            payload: StatusChanged {
                user_id: entrant.user_id.clone(),
                user_name: entrant.user_name.clone(),
                status,
            },
        };
        self.notifier.notify(event).await;
    }
}
