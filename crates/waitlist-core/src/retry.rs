//! Exponential-backoff retry policy for store calls.
//!
//! `RetryingGateway` wraps any `PersistenceGateway` and retries transient
//! (`DomainError::Storage`) failures with bounded attempts. Domain outcomes
//! such as `CapacityExceeded` or `EventNotFound` are returned immediately.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use uuid::Uuid;

use crate::entrant::{CountChange, Entrant, EntrantStatus, EventCapacity};
use crate::error::DomainError;
use crate::gateway::{PersistenceGateway, StatusWrite};

/// Retry policy configuration for exponential backoff.
///
/// # Default Values
///
/// - `max_retries`: 3
/// - `initial_delay`: 50ms
/// - `max_delay`: 2 seconds
/// - `multiplier`: 2 (delay doubles each retry)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first call.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (zero-based), capped at `max_delay`.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Runs `operation` until it succeeds, returns a non-transient error, or
    /// the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `operation`.
    pub async fn run<F, Fut, T>(
        &self,
        operation_name: &'static str,
        mut operation: F,
    ) -> Result<T, DomainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DomainError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            operation = operation_name,
                            attempt,
                            "store call succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for_attempt(attempt);
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "store call failed, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    if err.is_transient() {
                        tracing::error!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "store call failed after max retries"
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}

/// Gateway decorator applying a `RetryPolicy` to every call.
#[derive(Debug, Clone)]
pub struct RetryingGateway<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G> RetryingGateway<G> {
    /// Wraps `inner` with `policy`.
    #[must_use]
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Returns the wrapped gateway.
    pub fn inner(&self) -> &G {
        &self.inner
    }
}

#[async_trait]
impl<G: PersistenceGateway> PersistenceGateway for RetryingGateway<G> {
    async fn create_event(
        &self,
        event_id: Uuid,
        capacity: u32,
        sample_size: u32,
    ) -> Result<(), DomainError> {
        self.policy
            .run("create_event", || {
                self.inner.create_event(event_id, capacity, sample_size)
            })
            .await
    }

    async fn get_capacity(&self, event_id: Uuid) -> Result<EventCapacity, DomainError> {
        self.policy
            .run("get_capacity", || self.inner.get_capacity(event_id))
            .await
    }

    async fn fetch_entrants(
        &self,
        event_id: Uuid,
        status: EntrantStatus,
    ) -> Result<Vec<Entrant>, DomainError> {
        self.policy
            .run("fetch_entrants", || self.inner.fetch_entrants(event_id, status))
            .await
    }

    async fn fetch_all_entrants(&self, event_id: Uuid) -> Result<Vec<Entrant>, DomainError> {
        self.policy
            .run("fetch_all_entrants", || self.inner.fetch_all_entrants(event_id))
            .await
    }

    async fn fetch_entrant(
        &self,
        event_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Entrant>, DomainError> {
        self.policy
            .run("fetch_entrant", || self.inner.fetch_entrant(event_id, user_id))
            .await
    }

    async fn insert_entrant(&self, event_id: Uuid, entrant: &Entrant) -> Result<(), DomainError> {
        self.policy
            .run("insert_entrant", || self.inner.insert_entrant(event_id, entrant))
            .await
    }

    async fn conditional_increment_count(
        &self,
        event_id: Uuid,
        delta: u32,
        max_cap: u32,
    ) -> Result<u32, DomainError> {
        self.policy
            .run("conditional_increment_count", || {
                self.inner.conditional_increment_count(event_id, delta, max_cap)
            })
            .await
    }

    async fn saturating_decrement_count(
        &self,
        event_id: Uuid,
        delta: u32,
    ) -> Result<CountChange, DomainError> {
        self.policy
            .run("saturating_decrement_count", || {
                self.inner.saturating_decrement_count(event_id, delta)
            })
            .await
    }

    async fn write_entrant_status(
        &self,
        event_id: Uuid,
        user_id: &str,
        expected: EntrantStatus,
        status: EntrantStatus,
        write_id: Uuid,
    ) -> Result<StatusWrite, DomainError> {
        // Safe to replay: the store reports `Written` for a write_id it already applied.
        self.policy
            .run("write_entrant_status", || {
                self.inner
                    .write_entrant_status(event_id, user_id, expected, status, write_id)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            multiplier: 2,
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(350),
            multiplier: 2,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(350));
        assert_eq!(policy.delay_for_attempt(30), Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_run_retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .run("op", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DomainError::Storage("timeout".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(2)
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::Storage("down".into()))
            })
            .await;

        assert!(matches!(result, Err(DomainError::Storage(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_does_not_retry_domain_errors() {
        let calls = AtomicU32::new(0);
        let event_id = Uuid::new_v4();
        let result: Result<(), _> = fast_policy(5)
            .run("op", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::EventNotFound(event_id))
            })
            .await;

        assert!(matches!(result, Err(DomainError::EventNotFound(id)) if id == event_id));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
