//! Notification fakes: a recording notifier and a frozen clock.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use waitlist_core::event::{Clock, StatusChangedEvent, StatusNotifier};

/// Stamps every notification with the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A notifier that records every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<StatusChangedEvent>>,
}

impl RecordingNotifier {
    /// Create an empty recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all notifications received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn events(&self) -> Vec<StatusChangedEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Returns the user ids notified, in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn notified_user_ids(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.payload.user_id.clone())
            .collect()
    }
}

#[async_trait]
impl StatusNotifier for RecordingNotifier {
    async fn notify(&self, event: StatusChangedEvent) {
        self.events.lock().unwrap().push(event);
    }
}
