//! Test gateways: in-memory and failure-injecting `PersistenceGateway`
//! implementations.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use uuid::Uuid;
use waitlist_core::entrant::{CountChange, Entrant, EntrantStatus, EventCapacity};
use waitlist_core::error::DomainError;
use waitlist_core::gateway::{PersistenceGateway, StatusWrite};

#[derive(Debug)]
struct EventRecord {
    capacity: u32,
    current_attendees: u32,
    sample_size: u32,
    high_water_mark: u32,
    entrants: BTreeMap<String, Entrant>,
    last_write_ids: HashMap<String, Uuid>,
}

/// A gateway backed by in-process maps. Every method runs under one lock, so
/// the conditional counter update and the status compare-and-set are atomic
/// exactly like the single-document primitives of the real store.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    events: Mutex<HashMap<Uuid, EventRecord>>,
    failing_writes: Mutex<HashSet<String>>,
    interleaved: Mutex<HashMap<String, EntrantStatus>>,
    competing_claims: Mutex<HashSet<String>>,
    competing_claims_granted: AtomicU32,
    status_writes: AtomicU32,
}

impl InMemoryGateway {
    /// Create an empty gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an event summary with an arbitrary starting counter.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn seed_event(&self, event_id: Uuid, capacity: u32, current_attendees: u32, sample_size: u32) {
        self.events.lock().unwrap().insert(
            event_id,
            EventRecord {
                capacity,
                current_attendees,
                sample_size,
                high_water_mark: current_attendees,
                entrants: BTreeMap::new(),
                last_write_ids: HashMap::new(),
            },
        );
    }

    /// Seeds an entrant record in any status without touching the counter.
    ///
    /// # Panics
    ///
    /// Panics if the event was not seeded or the mutex is poisoned.
    pub fn seed_entrant(&self, event_id: Uuid, entrant: Entrant) {
        self.events
            .lock()
            .unwrap()
            .get_mut(&event_id)
            .expect("seed_entrant requires a seeded event")
            .entrants
            .insert(entrant.user_id.clone(), entrant);
    }

    /// Seeds `count` waiting entrants named `user-0..user-{count-1}` and
    /// returns their ids.
    pub fn seed_waiting_pool(&self, event_id: Uuid, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let user_id = format!("user-{i}");
                self.seed_entrant(
                    event_id,
                    Entrant::waiting(user_id.clone(), format!("User {i}"), format!("user{i}@example.com")),
                );
                user_id
            })
            .collect()
    }

    /// Makes every status write for `user_id` fail with a storage error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_status_writes_for(&self, user_id: &str) {
        self.failing_writes.lock().unwrap().insert(user_id.to_owned());
    }

    /// Clears all injected write failures.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear_failures(&self) {
        self.failing_writes.lock().unwrap().clear();
    }

    /// Simulates another session moving `user_id` to `status` just before the
    /// next status write for that user lands.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn interleave_status_change(&self, user_id: &str, status: EntrantStatus) {
        self.interleaved
            .lock()
            .unwrap()
            .insert(user_id.to_owned(), status);
    }

    /// Simulates another session trying to take one seat just before the
    /// next status write for `user_id` lands. The claim succeeds only if the
    /// counter has room; see `competing_claims_granted`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn compete_for_seat_before_write(&self, user_id: &str) {
        self.competing_claims
            .lock()
            .unwrap()
            .insert(user_id.to_owned());
    }

    /// Number of competing seat claims that found room.
    pub fn competing_claims_granted(&self) -> u32 {
        self.competing_claims_granted.load(Ordering::SeqCst)
    }

    /// Current stored status of an entrant.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn entrant_status(&self, event_id: Uuid, user_id: &str) -> Option<EntrantStatus> {
        self.events
            .lock()
            .unwrap()
            .get(&event_id)
            .and_then(|record| record.entrants.get(user_id))
            .map(|e| e.status)
    }

    /// Current attendee counter of an event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn current_attendees(&self, event_id: Uuid) -> Option<u32> {
        self.events
            .lock()
            .unwrap()
            .get(&event_id)
            .map(|record| record.current_attendees)
    }

    /// Highest counter value ever stored for an event.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn high_water_mark(&self, event_id: Uuid) -> Option<u32> {
        self.events
            .lock()
            .unwrap()
            .get(&event_id)
            .map(|record| record.high_water_mark)
    }

    /// Number of status writes that reached the store.
    pub fn status_write_count(&self) -> u32 {
        self.status_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create_event(
        &self,
        event_id: Uuid,
        capacity: u32,
        sample_size: u32,
    ) -> Result<(), DomainError> {
        let mut events = self.events.lock().unwrap();
        if events.contains_key(&event_id) {
            return Err(DomainError::Validation(format!(
                "event {event_id} already exists"
            )));
        }
        events.insert(
            event_id,
            EventRecord {
                capacity,
                current_attendees: 0,
                sample_size,
                high_water_mark: 0,
                entrants: BTreeMap::new(),
                last_write_ids: HashMap::new(),
            },
        );
        Ok(())
    }

    async fn get_capacity(&self, event_id: Uuid) -> Result<EventCapacity, DomainError> {
        self.events
            .lock()
            .unwrap()
            .get(&event_id)
            .map(|record| EventCapacity {
                event_id,
                capacity: record.capacity,
                current_attendees: record.current_attendees,
                sample_size: record.sample_size,
            })
            .ok_or(DomainError::EventNotFound(event_id))
    }

    async fn fetch_entrants(
        &self,
        event_id: Uuid,
        status: EntrantStatus,
    ) -> Result<Vec<Entrant>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(&event_id)
            .map(|record| {
                record
                    .entrants
                    .values()
                    .filter(|e| e.status == status)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_all_entrants(&self, event_id: Uuid) -> Result<Vec<Entrant>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(&event_id)
            .map(|record| record.entrants.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_entrant(
        &self,
        event_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Entrant>, DomainError> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .get(&event_id)
            .and_then(|record| record.entrants.get(user_id).cloned()))
    }

    async fn insert_entrant(&self, event_id: Uuid, entrant: &Entrant) -> Result<(), DomainError> {
        let mut events = self.events.lock().unwrap();
        let record = events
            .get_mut(&event_id)
            .ok_or(DomainError::EventNotFound(event_id))?;
        if record.entrants.contains_key(&entrant.user_id) {
            return Err(DomainError::AlreadyRegistered {
                event_id,
                user_id: entrant.user_id.clone(),
            });
        }
        record
            .entrants
            .insert(entrant.user_id.clone(), entrant.clone());
        Ok(())
    }

    async fn conditional_increment_count(
        &self,
        event_id: Uuid,
        delta: u32,
        max_cap: u32,
    ) -> Result<u32, DomainError> {
        let mut events = self.events.lock().unwrap();
        let record = events
            .get_mut(&event_id)
            .ok_or(DomainError::EventNotFound(event_id))?;
        match record.current_attendees.checked_add(delta) {
            Some(next) if next <= max_cap => {
                record.current_attendees = next;
                record.high_water_mark = record.high_water_mark.max(next);
                Ok(next)
            }
            _ => Err(DomainError::CapacityExceeded {
                event_id,
                requested: delta,
                remaining: max_cap.saturating_sub(record.current_attendees),
            }),
        }
    }

    async fn saturating_decrement_count(
        &self,
        event_id: Uuid,
        delta: u32,
    ) -> Result<CountChange, DomainError> {
        let mut events = self.events.lock().unwrap();
        let record = events
            .get_mut(&event_id)
            .ok_or(DomainError::EventNotFound(event_id))?;
        let previous = record.current_attendees;
        record.current_attendees = previous.saturating_sub(delta);
        Ok(CountChange {
            previous,
            current: record.current_attendees,
        })
    }

    async fn write_entrant_status(
        &self,
        event_id: Uuid,
        user_id: &str,
        expected: EntrantStatus,
        status: EntrantStatus,
        write_id: Uuid,
    ) -> Result<StatusWrite, DomainError> {
        if self.failing_writes.lock().unwrap().contains(user_id) {
            return Err(DomainError::Storage(format!(
                "write rejected for entrant {user_id}"
            )));
        }
        let interleaved = self.interleaved.lock().unwrap().remove(user_id);
        let competing = self.competing_claims.lock().unwrap().remove(user_id);

        let mut events = self.events.lock().unwrap();
        let not_found = || DomainError::EntrantNotFound {
            event_id,
            user_id: user_id.to_owned(),
        };
        let record = events.get_mut(&event_id).ok_or_else(not_found)?;
        if competing && record.current_attendees < record.capacity {
            record.current_attendees += 1;
            record.high_water_mark = record.high_water_mark.max(record.current_attendees);
            self.competing_claims_granted.fetch_add(1, Ordering::SeqCst);
        }
        let last_write_id = record.last_write_ids.get(user_id).copied();
        let entrant = record.entrants.get_mut(user_id).ok_or_else(not_found)?;
        if let Some(concurrent) = interleaved {
            entrant.status = concurrent;
        }
        if entrant.status == status && last_write_id == Some(write_id) {
            return Ok(StatusWrite::Written);
        }
        if entrant.status != expected {
            return Ok(StatusWrite::Conflict(entrant.status));
        }
        entrant.status = status;
        record.last_write_ids.insert(user_id.to_owned(), write_id);
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(StatusWrite::Written)
    }
}

/// A gateway that always returns a storage error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingGateway;

fn connection_refused<T>() -> Result<T, DomainError> {
    Err(DomainError::Storage("connection refused".into()))
}

#[async_trait]
impl PersistenceGateway for FailingGateway {
    async fn create_event(&self, _: Uuid, _: u32, _: u32) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn get_capacity(&self, _: Uuid) -> Result<EventCapacity, DomainError> {
        connection_refused()
    }

    async fn fetch_entrants(&self, _: Uuid, _: EntrantStatus) -> Result<Vec<Entrant>, DomainError> {
        connection_refused()
    }

    async fn fetch_all_entrants(&self, _: Uuid) -> Result<Vec<Entrant>, DomainError> {
        connection_refused()
    }

    async fn fetch_entrant(&self, _: Uuid, _: &str) -> Result<Option<Entrant>, DomainError> {
        connection_refused()
    }

    async fn insert_entrant(&self, _: Uuid, _: &Entrant) -> Result<(), DomainError> {
        connection_refused()
    }

    async fn conditional_increment_count(&self, _: Uuid, _: u32, _: u32) -> Result<u32, DomainError> {
        connection_refused()
    }

    async fn saturating_decrement_count(&self, _: Uuid, _: u32) -> Result<CountChange, DomainError> {
        connection_refused()
    }

    async fn write_entrant_status(
        &self,
        _: Uuid,
        _: &str,
        _: EntrantStatus,
        _: EntrantStatus,
        _: Uuid,
    ) -> Result<StatusWrite, DomainError> {
        connection_refused()
    }
}

/// Where a `FlakyGateway` injects its failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailurePoint {
    /// Any call fails before reaching the inner gateway.
    BeforeCall,
    /// Status writes commit on the inner gateway, then the reply is lost.
    AfterStatusWrite,
}

/// A gateway that fails the first `failures` calls with a storage error and
/// then delegates to `inner`. Used to exercise retry policies.
#[derive(Debug)]
pub struct FlakyGateway<G> {
    inner: G,
    failure_point: FailurePoint,
    remaining_failures: AtomicU32,
    calls: AtomicU32,
}

impl<G> FlakyGateway<G> {
    /// Wraps `inner`, failing the next `failures` calls.
    #[must_use]
    pub fn new(inner: G, failures: u32) -> Self {
        Self::with_failure_point(inner, failures, FailurePoint::BeforeCall)
    }

    /// Wraps `inner` so the next `failures` status writes are applied but
    /// answered with a storage error, as when a reply is lost in transit.
    /// Other calls pass straight through.
    #[must_use]
    pub fn losing_status_replies(inner: G, failures: u32) -> Self {
        Self::with_failure_point(inner, failures, FailurePoint::AfterStatusWrite)
    }

    fn with_failure_point(inner: G, failures: u32, failure_point: FailurePoint) -> Self {
        Self {
            inner,
            failure_point,
            remaining_failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
        }
    }

    /// Total calls received, failed or not.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    fn trip(&self) -> Result<(), DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failure_point == FailurePoint::BeforeCall {
            self.consume_failure()
        } else {
            Ok(())
        }
    }

    fn consume_failure(&self) -> Result<(), DomainError> {
        let tripped = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if tripped {
            connection_refused()
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<G: PersistenceGateway> PersistenceGateway for FlakyGateway<G> {
    async fn create_event(
        &self,
        event_id: Uuid,
        capacity: u32,
        sample_size: u32,
    ) -> Result<(), DomainError> {
        self.trip()?;
        self.inner.create_event(event_id, capacity, sample_size).await
    }

    async fn get_capacity(&self, event_id: Uuid) -> Result<EventCapacity, DomainError> {
        self.trip()?;
        self.inner.get_capacity(event_id).await
    }

    async fn fetch_entrants(
        &self,
        event_id: Uuid,
        status: EntrantStatus,
    ) -> Result<Vec<Entrant>, DomainError> {
        self.trip()?;
        self.inner.fetch_entrants(event_id, status).await
    }

    async fn fetch_all_entrants(&self, event_id: Uuid) -> Result<Vec<Entrant>, DomainError> {
        self.trip()?;
        self.inner.fetch_all_entrants(event_id).await
    }

    async fn fetch_entrant(
        &self,
        event_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Entrant>, DomainError> {
        self.trip()?;
        self.inner.fetch_entrant(event_id, user_id).await
    }

    async fn insert_entrant(&self, event_id: Uuid, entrant: &Entrant) -> Result<(), DomainError> {
        self.trip()?;
        self.inner.insert_entrant(event_id, entrant).await
    }

    async fn conditional_increment_count(
        &self,
        event_id: Uuid,
        delta: u32,
        max_cap: u32,
    ) -> Result<u32, DomainError> {
        self.trip()?;
        self.inner
            .conditional_increment_count(event_id, delta, max_cap)
            .await
    }

    async fn saturating_decrement_count(
        &self,
        event_id: Uuid,
        delta: u32,
    ) -> Result<CountChange, DomainError> {
        self.trip()?;
        self.inner.saturating_decrement_count(event_id, delta).await
    }

    async fn write_entrant_status(
        &self,
        event_id: Uuid,
        user_id: &str,
        expected: EntrantStatus,
        status: EntrantStatus,
        write_id: Uuid,
    ) -> Result<StatusWrite, DomainError> {
        self.trip()?;
        let written = self
            .inner
            .write_entrant_status(event_id, user_id, expected, status, write_id)
            .await?;
        if self.failure_point == FailurePoint::AfterStatusWrite {
            self.consume_failure()?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_conditional_increment_refuses_overshoot_without_partial_update() {
        let gateway = InMemoryGateway::new();
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 5, 4, 2);

        let result = gateway.conditional_increment_count(event_id, 2, 5).await;

        assert!(matches!(
            result,
            Err(DomainError::CapacityExceeded { requested: 2, remaining: 1, .. })
        ));
        assert_eq!(gateway.current_attendees(event_id), Some(4));
    }

    #[tokio::test]
    async fn test_status_write_reports_conflict_when_expected_differs() {
        let gateway = InMemoryGateway::new();
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 5, 0, 2);
        gateway.seed_entrant(event_id, Entrant::waiting("a", "A", "a@example.com"));

        let result = gateway
            .write_entrant_status(
                event_id,
                "a",
                EntrantStatus::Selected,
                EntrantStatus::Confirmed,
                Uuid::new_v4(),
            )
            .await
            .unwrap();

        assert_eq!(result, StatusWrite::Conflict(EntrantStatus::Waiting));
        assert_eq!(gateway.status_write_count(), 0);
    }

    #[tokio::test]
    async fn test_replayed_status_write_is_written_but_other_writes_conflict() {
        let gateway = InMemoryGateway::new();
        let event_id = Uuid::new_v4();
        gateway.seed_event(event_id, 5, 0, 2);
        gateway.seed_entrant(event_id, Entrant::waiting("a", "A", "a@example.com"));
        let write_id = Uuid::new_v4();
        let select = |write_id| {
            gateway.write_entrant_status(
                event_id,
                "a",
                EntrantStatus::Waiting,
                EntrantStatus::Selected,
                write_id,
            )
        };

        assert_eq!(select(write_id).await.unwrap(), StatusWrite::Written);
        assert_eq!(select(write_id).await.unwrap(), StatusWrite::Written);
        assert_eq!(
            select(Uuid::new_v4()).await.unwrap(),
            StatusWrite::Conflict(EntrantStatus::Selected)
        );
        assert_eq!(gateway.status_write_count(), 1);
    }

    #[tokio::test]
    async fn test_lost_status_reply_still_commits_the_write() {
        let inner = InMemoryGateway::new();
        let event_id = Uuid::new_v4();
        inner.seed_event(event_id, 5, 0, 2);
        inner.seed_entrant(event_id, Entrant::waiting("a", "A", "a@example.com"));
        let gateway = FlakyGateway::losing_status_replies(inner, 1);

        let result = gateway
            .write_entrant_status(
                event_id,
                "a",
                EntrantStatus::Waiting,
                EntrantStatus::Selected,
                Uuid::new_v4(),
            )
            .await;

        assert!(matches!(result, Err(DomainError::Storage(_))));
        assert_eq!(
            gateway.inner().entrant_status(event_id, "a"),
            Some(EntrantStatus::Selected)
        );
        assert!(gateway.get_capacity(event_id).await.is_ok());
    }

    #[tokio::test]
    async fn test_flaky_gateway_recovers_after_configured_failures() {
        let inner = InMemoryGateway::new();
        let event_id = Uuid::new_v4();
        inner.seed_event(event_id, 5, 0, 2);
        let gateway = FlakyGateway::new(inner, 1);

        assert!(gateway.get_capacity(event_id).await.is_err());
        assert!(gateway.get_capacity(event_id).await.is_ok());
        assert_eq!(gateway.calls(), 2);
    }
}
