//! Integration tests for `PgPersistenceGateway`.
//!
//! These need a live database: `DATABASE_URL=... cargo test -- --ignored`.

use sqlx::PgPool;
use uuid::Uuid;
use waitlist_core::entrant::{CountChange, Entrant, EntrantStatus};
use waitlist_core::error::DomainError;
use waitlist_core::gateway::{PersistenceGateway, StatusWrite};
use waitlist_store::PgPersistenceGateway;

async fn gateway_with_event(pool: PgPool, capacity: u32) -> (PgPersistenceGateway, Uuid) {
    let gateway = PgPersistenceGateway::new(pool);
    let event_id = Uuid::new_v4();
    gateway.create_event(event_id, capacity, 2).await.unwrap();
    (gateway, event_id)
}

// --- events ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_create_event_then_get_capacity(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 10).await;

    let summary = gateway.get_capacity(event_id).await.unwrap();

    assert_eq!(summary.capacity, 10);
    assert_eq!(summary.current_attendees, 0);
    assert_eq!(summary.sample_size, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_get_capacity_unknown_event_is_not_found(pool: PgPool) {
    let gateway = PgPersistenceGateway::new(pool);

    let err = gateway.get_capacity(Uuid::new_v4()).await.unwrap_err();

    assert!(matches!(err, DomainError::EventNotFound(_)));
}

// --- entrants ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_and_fetch_entrant(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 10).await;
    let entrant = Entrant::waiting("u-1", "Ada", "ada@example.com");

    gateway.insert_entrant(event_id, &entrant).await.unwrap();

    let loaded = gateway.fetch_entrant(event_id, "u-1").await.unwrap();
    assert_eq!(loaded, Some(entrant));
    let waiting = gateway
        .fetch_entrants(event_id, EntrantStatus::Waiting)
        .await
        .unwrap();
    assert_eq!(waiting.len(), 1);
    assert!(gateway.fetch_entrant(event_id, "ghost").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_duplicate_entrant_is_already_registered(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 10).await;
    let entrant = Entrant::waiting("u-1", "Ada", "ada@example.com");
    gateway.insert_entrant(event_id, &entrant).await.unwrap();

    let err = gateway.insert_entrant(event_id, &entrant).await.unwrap_err();

    assert!(matches!(err, DomainError::AlreadyRegistered { .. }));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_insert_entrant_for_unknown_event_is_not_found(pool: PgPool) {
    let gateway = PgPersistenceGateway::new(pool);
    let entrant = Entrant::waiting("u-1", "Ada", "ada@example.com");

    let err = gateway
        .insert_entrant(Uuid::new_v4(), &entrant)
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::EventNotFound(_)));
}

// --- counter ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_conditional_increment_refuses_past_capacity(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 3).await;

    assert_eq!(
        gateway.conditional_increment_count(event_id, 2, 3).await.unwrap(),
        2
    );
    let err = gateway
        .conditional_increment_count(event_id, 2, 3)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DomainError::CapacityExceeded { requested: 2, remaining: 1, .. }
    ));
    assert_eq!(gateway.get_capacity(event_id).await.unwrap().current_attendees, 2);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_increments_stop_at_capacity(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 5).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.conditional_increment_count(event_id, 1, 5).await })
        })
        .collect();
    let mut granted = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            granted += 1;
        }
    }

    assert_eq!(granted, 5);
    assert_eq!(gateway.get_capacity(event_id).await.unwrap().current_attendees, 5);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_saturating_decrement_clamps_at_zero(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 5).await;
    gateway.conditional_increment_count(event_id, 1, 5).await.unwrap();

    let change = gateway.saturating_decrement_count(event_id, 3).await.unwrap();

    assert_eq!(change, CountChange { previous: 1, current: 0 });
}

// --- status writes ---

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_status_write_compares_expected_status(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 5).await;
    gateway
        .insert_entrant(event_id, &Entrant::waiting("u-1", "Ada", "ada@example.com"))
        .await
        .unwrap();

    let first = gateway
        .write_entrant_status(
            event_id,
            "u-1",
            EntrantStatus::Waiting,
            EntrantStatus::Selected,
            Uuid::new_v4(),
        )
        .await
        .unwrap();
    let second = gateway
        .write_entrant_status(
            event_id,
            "u-1",
            EntrantStatus::Waiting,
            EntrantStatus::Cancelled,
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    assert_eq!(first, StatusWrite::Written);
    assert_eq!(second, StatusWrite::Conflict(EntrantStatus::Selected));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_replayed_status_write_is_reported_written(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 5).await;
    gateway
        .insert_entrant(event_id, &Entrant::waiting("u-1", "Ada", "ada@example.com"))
        .await
        .unwrap();
    let write_id = Uuid::new_v4();

    for _ in 0..2 {
        let outcome = gateway
            .write_entrant_status(
                event_id,
                "u-1",
                EntrantStatus::Waiting,
                EntrantStatus::Selected,
                write_id,
            )
            .await
            .unwrap();
        assert_eq!(outcome, StatusWrite::Written);
    }
    let other = gateway
        .write_entrant_status(
            event_id,
            "u-1",
            EntrantStatus::Waiting,
            EntrantStatus::Selected,
            Uuid::new_v4(),
        )
        .await
        .unwrap();

    assert_eq!(other, StatusWrite::Conflict(EntrantStatus::Selected));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_status_write_for_missing_entrant_is_not_found(pool: PgPool) {
    let (gateway, event_id) = gateway_with_event(pool, 5).await;

    let err = gateway
        .write_entrant_status(
            event_id,
            "ghost",
            EntrantStatus::Waiting,
            EntrantStatus::Selected,
            Uuid::new_v4(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::EntrantNotFound { .. }));
}
