//! Status-change notifications emitted by the lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entrant::EntrantStatus;

/// Event type name for a status-change notification.
pub const STATUS_CHANGED_EVENT_TYPE: &str = "waitlist.status_changed";

/// Metadata attached to every emitted notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique notification identifier.
    pub event_id: Uuid,
    /// Type name for routing by the dispatcher.
    pub event_type: String,
    /// The waitlist (event) the notification belongs to.
    pub waitlist_id: Uuid,
    /// Correlation ID for tracing a command through its effects.
    pub correlation_id: Uuid,
    /// Timestamp of the change.
    pub occurred_at: DateTime<Utc>,
}

/// Source of `occurred_at` stamps for notifications.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Trait that all emitted notifications implement.
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Returns the event type name.
    fn event_type(&self) -> &'static str;

    /// Serializes the notification payload to JSON.
    fn to_payload(&self) -> serde_json::Value;

    /// Returns the metadata for this notification.
    fn metadata(&self) -> &EventMetadata;
}

/// Fired once per entrant that actually moved into a new status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    /// The entrant whose status changed.
    pub user_id: String,
    /// The entrant's display name.
    pub user_name: String,
    /// The status the entrant now holds.
    pub status: EntrantStatus,
}

/// Envelope pairing a `StatusChanged` payload with its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangedEvent {
    /// Notification metadata.
    pub metadata: EventMetadata,
    /// The payload handed to the dispatcher.
    pub payload: StatusChanged,
}

impl DomainEvent for StatusChangedEvent {
    fn event_type(&self) -> &'static str {
        STATUS_CHANGED_EVENT_TYPE
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "user_id": self.payload.user_id,
            "user_name": self.payload.user_name,
            "status": self.payload.status,
        })
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}

/// Sink for status-change notifications. Delivery is the dispatcher's concern.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    /// Hands one notification to the dispatcher.
    async fn notify(&self, event: StatusChangedEvent);
}

/// Notifier that records every notification as a structured log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl StatusNotifier for TracingNotifier {
    async fn notify(&self, event: StatusChangedEvent) {
        tracing::info!(
            event_type = event.event_type(),
            notification_id = %event.metadata.event_id,
            waitlist_id = %event.metadata.waitlist_id,
            correlation_id = %event.metadata.correlation_id,
            user_id = %event.payload.user_id,
            user_name = %event.payload.user_name,
            status = %event.payload.status,
            "entrant status changed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_carries_user_and_new_status() {
        let event = StatusChangedEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                event_type: STATUS_CHANGED_EVENT_TYPE.to_owned(),
                waitlist_id: Uuid::new_v4(),
                correlation_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
            },
            payload: StatusChanged {
                user_id: "u-1".to_owned(),
                user_name: "Ada".to_owned(),
                status: EntrantStatus::Selected,
            },
        };

        let payload = event.to_payload();
        assert_eq!(payload["user_id"], "u-1");
        assert_eq!(payload["user_name"], "Ada");
        assert_eq!(payload["status"], "selected");
        assert_eq!(event.event_type(), "waitlist.status_changed");
    }
}
