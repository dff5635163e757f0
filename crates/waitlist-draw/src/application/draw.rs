//! Randomized promotion of waiting entrants.

use std::sync::{Arc, Mutex};

use tracing::{info, instrument};
use uuid::Uuid;
use waitlist_core::entrant::EntrantStatus;
use waitlist_core::error::DomainError;
use waitlist_core::rng::DeterministicRng;

use crate::application::capacity::CapacityTracker;
use crate::application::registry::EntrantRegistry;
use crate::application::transition::StatusTransition;
use crate::domain::outcomes::DrawResult;
use crate::domain::sampling::sample_uniform;

/// Selects a capacity-bounded uniform subset of an event's waiting pool and
/// moves it to `selected`.
#[derive(Clone)]
pub struct DrawEngine {
    registry: EntrantRegistry,
    capacity: CapacityTracker,
    transition: StatusTransition,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
}

impl DrawEngine {
    /// Creates a draw engine from its collaborators.
    #[must_use]
    pub fn new(
        registry: EntrantRegistry,
        capacity: CapacityTracker,
        transition: StatusTransition,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    ) -> Self {
        Self {
            registry,
            capacity,
            transition,
            rng,
        }
    }

    /// Promotes up to `requested_size` waiting entrants, bounded by the pool
    /// size and the seats left.
    ///
    /// An empty pool or a zero-size request yields an empty result. Entrants
    /// whose transition failed are reported in `DrawResult::failed` for retry.
    ///
    /// The RNG lock is held only for the synchronous sampling step, never
    /// across an await.
    ///
    /// # Errors
    ///
    /// - `DomainError::EventNotFound` if the event is unknown.
    /// - `DomainError::CapacityExceeded` if the event is full while entrants
    ///   are still waiting. Nothing is written in that case.
    /// - `DomainError::Storage` if the pool or the capacity could not be read.
    #[instrument(skip(self))]
    pub async fn draw(
        &self,
        event_id: Uuid,
        requested_size: u32,
        correlation_id: Uuid,
    ) -> Result<DrawResult, DomainError> {
        let pool = self
            .registry
            .list_by_status(event_id, EntrantStatus::Waiting)
            .await?;
        let remaining = self.capacity.remaining(event_id).await?;

        if pool.is_empty() || requested_size == 0 {
            info!(pool = pool.len(), "nothing to draw");
            return Ok(DrawResult::empty(event_id));
        }
        let pool_size = u32::try_from(pool.len()).unwrap_or(u32::MAX);
        if remaining == 0 {
            return Err(DomainError::CapacityExceeded {
                event_id,
                requested: requested_size.min(pool_size),
                remaining,
            });
        }

        let effective_size = requested_size.min(pool_size).min(remaining);
        let selected_ids: Vec<String> = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|e| DomainError::Internal(format!("RNG mutex poisoned: {e}")))?;
            sample_uniform(&pool, effective_size as usize, &mut *rng)
                .into_iter()
                .map(|entrant| entrant.user_id)
                .collect()
        };

        info!(
            pool = pool.len(),
            remaining,
            effective_size,
            "drawing entrants"
        );

        let outcome = self
            .transition
            .apply_batch(event_id, &selected_ids, EntrantStatus::Selected, correlation_id)
            .await;

        Ok(DrawResult {
            event_id,
            effective_size,
            selected_user_ids: outcome.succeeded,
            failed: outcome.failed,
        })
    }

    /// Runs a draw sized by the event's configured sample size.
    ///
    /// # Errors
    ///
    /// Same as [`DrawEngine::draw`].
    pub async fn draw_default(
        &self,
        event_id: Uuid,
        correlation_id: Uuid,
    ) -> Result<DrawResult, DomainError> {
        let sample_size = self.capacity.snapshot(event_id).await?.sample_size;
        self.draw(event_id, sample_size, correlation_id).await
    }
}
