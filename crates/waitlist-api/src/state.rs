//! Shared application state.

use std::sync::{Arc, Mutex};

use waitlist_core::event::{Clock, StatusNotifier};
use waitlist_core::gateway::PersistenceGateway;
use waitlist_core::rng::DeterministicRng;
use waitlist_draw::application::{CapacityTracker, DrawEngine, EntrantRegistry, StatusTransition};

/// Application state shared across all request handlers.
///
/// Every component shares the same gateway, so the HTTP layer holds no
/// state of its own beyond these handles.
#[derive(Clone)]
pub struct AppState {
    /// Store behind every component.
    pub gateway: Arc<dyn PersistenceGateway>,
    /// Entrant reads and registration.
    pub registry: EntrantRegistry,
    /// Seat accounting.
    pub capacity: CapacityTracker,
    /// Single writer of entrant statuses.
    pub transition: StatusTransition,
    /// Randomized promotion of waiting entrants.
    pub draw: DrawEngine,
}

impl AppState {
    /// Wires the lifecycle components over `gateway`.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        clock: Arc<dyn Clock>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        notifier: Arc<dyn StatusNotifier>,
    ) -> Self {
        let registry = EntrantRegistry::new(gateway.clone());
        let capacity = CapacityTracker::new(gateway.clone());
        let transition = StatusTransition::new(gateway.clone(), notifier, clock);
        let draw = DrawEngine::new(
            registry.clone(),
            capacity.clone(),
            transition.clone(),
            rng,
        );
        Self {
            gateway,
            registry,
            capacity,
            transition,
            draw,
        }
    }
}
