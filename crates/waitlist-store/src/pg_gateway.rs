//! `PostgreSQL` implementation of the `PersistenceGateway` trait.
//!
//! Each method is a single statement against one row, so the row lock taken
//! by `UPDATE` provides the atomic read-modify-write the lifecycle relies on.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use waitlist_core::entrant::{CountChange, Entrant, EntrantStatus, EventCapacity};
use waitlist_core::error::DomainError;
use waitlist_core::gateway::{PersistenceGateway, StatusWrite};

use crate::schema;

const SELECT_ENTRANT_COLUMNS: &str =
    "SELECT user_id, user_name, user_email, status FROM waitlist_entrants";

/// PostgreSQL-backed persistence gateway.
#[derive(Debug, Clone)]
pub struct PgPersistenceGateway {
    pool: PgPool,
}

impl PgPersistenceGateway {
    /// Creates a new `PgPersistenceGateway`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the waitlist tables if they are missing.
    ///
    /// # Errors
    ///
    /// Returns the driver error if a statement fails.
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        for statement in schema::ALL_TABLES {
            sqlx::raw_sql(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn storage(operation: &str, err: &sqlx::Error) -> DomainError {
    DomainError::Storage(format!("{operation}: {err}"))
}

fn to_column(name: &str, value: u32) -> Result<i32, DomainError> {
    i32::try_from(value)
        .map_err(|_| DomainError::Validation(format!("{name} {value} exceeds storage range")))
}

fn from_column(name: &str, value: i32) -> Result<u32, DomainError> {
    u32::try_from(value)
        .map_err(|_| DomainError::Storage(format!("stored {name} is negative: {value}")))
}

fn entrant_from_row(row: &PgRow) -> Result<Entrant, DomainError> {
    let decode = |e: sqlx::Error| storage("decode entrant", &e);
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(Entrant {
        user_id: row.try_get("user_id").map_err(decode)?,
        user_name: row.try_get("user_name").map_err(decode)?,
        user_email: row.try_get("user_email").map_err(decode)?,
        status: status
            .parse()
            .map_err(|_| DomainError::Storage(format!("stored status is unknown: {status}")))?,
    })
}

#[async_trait]
impl PersistenceGateway for PgPersistenceGateway {
    async fn create_event(
        &self,
        event_id: Uuid,
        capacity: u32,
        sample_size: u32,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO event_waitlists (event_id, max_attendees, current_attendees, sample_size) \
             VALUES ($1, $2, 0, $3)",
        )
        .bind(event_id)
        .bind(to_column("max_attendees", capacity)?)
        .bind(to_column("sample_size", sample_size)?)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(
                DomainError::Validation(format!("event {event_id} already exists")),
            ),
            Err(e) => Err(storage("create event", &e)),
        }
    }

    async fn get_capacity(&self, event_id: Uuid) -> Result<EventCapacity, DomainError> {
        let row = sqlx::query(
            "SELECT max_attendees, current_attendees, sample_size \
             FROM event_waitlists WHERE event_id = $1",
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("load capacity", &e))?
        .ok_or(DomainError::EventNotFound(event_id))?;

        let decode = |e: sqlx::Error| storage("decode capacity", &e);
        Ok(EventCapacity {
            event_id,
            capacity: from_column("max_attendees", row.try_get("max_attendees").map_err(decode)?)?,
            current_attendees: from_column(
                "current_attendees",
                row.try_get("current_attendees").map_err(decode)?,
            )?,
            sample_size: from_column("sample_size", row.try_get("sample_size").map_err(decode)?)?,
        })
    }

    async fn fetch_entrants(
        &self,
        event_id: Uuid,
        status: EntrantStatus,
    ) -> Result<Vec<Entrant>, DomainError> {
        sqlx::query(&format!(
            "{SELECT_ENTRANT_COLUMNS} WHERE event_id = $1 AND status = $2"
        ))
        .bind(event_id)
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage("fetch entrants", &e))?
        .iter()
        .map(entrant_from_row)
        .collect()
    }

    async fn fetch_all_entrants(&self, event_id: Uuid) -> Result<Vec<Entrant>, DomainError> {
        sqlx::query(&format!("{SELECT_ENTRANT_COLUMNS} WHERE event_id = $1"))
            .bind(event_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage("fetch entrants", &e))?
            .iter()
            .map(entrant_from_row)
            .collect()
    }

    async fn fetch_entrant(
        &self,
        event_id: Uuid,
        user_id: &str,
    ) -> Result<Option<Entrant>, DomainError> {
        sqlx::query(&format!(
            "{SELECT_ENTRANT_COLUMNS} WHERE event_id = $1 AND user_id = $2"
        ))
        .bind(event_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("fetch entrant", &e))?
        .as_ref()
        .map(entrant_from_row)
        .transpose()
    }

    async fn insert_entrant(&self, event_id: Uuid, entrant: &Entrant) -> Result<(), DomainError> {
        let result = sqlx::query(
            "INSERT INTO waitlist_entrants (event_id, user_id, user_name, user_email, status) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event_id)
        .bind(&entrant.user_id)
        .bind(&entrant.user_name)
        .bind(&entrant.user_email)
        .bind(entrant.status.as_str())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DomainError::AlreadyRegistered {
                    event_id,
                    user_id: entrant.user_id.clone(),
                })
            }
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
                Err(DomainError::EventNotFound(event_id))
            }
            Err(e) => Err(storage("insert entrant", &e)),
        }
    }

    async fn conditional_increment_count(
        &self,
        event_id: Uuid,
        delta: u32,
        max_cap: u32,
    ) -> Result<u32, DomainError> {
        let updated: Option<i32> = sqlx::query_scalar(
            "UPDATE event_waitlists SET current_attendees = current_attendees + $2 \
             WHERE event_id = $1 AND current_attendees + $2 <= $3 \
             RETURNING current_attendees",
        )
        .bind(event_id)
        .bind(to_column("delta", delta)?)
        .bind(to_column("max_cap", max_cap)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("increment attendee count", &e))?;

        if let Some(count) = updated {
            return from_column("current_attendees", count);
        }

        // No row matched: either the event is missing or the limit would be passed.
        let summary = self.get_capacity(event_id).await?;
        debug!(%event_id, delta, max_cap, current = summary.current_attendees, "increment refused");
        Err(DomainError::CapacityExceeded {
            event_id,
            requested: delta,
            remaining: max_cap.saturating_sub(summary.current_attendees),
        })
    }

    async fn saturating_decrement_count(
        &self,
        event_id: Uuid,
        delta: u32,
    ) -> Result<CountChange, DomainError> {
        let row = sqlx::query(
            "UPDATE event_waitlists w \
             SET current_attendees = GREATEST(p.previous - $2, 0) \
             FROM (SELECT event_id, current_attendees AS previous \
                   FROM event_waitlists WHERE event_id = $1 FOR UPDATE) p \
             WHERE w.event_id = p.event_id \
             RETURNING p.previous, w.current_attendees",
        )
        .bind(event_id)
        .bind(to_column("delta", delta)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage("decrement attendee count", &e))?
        .ok_or(DomainError::EventNotFound(event_id))?;

        let decode = |e: sqlx::Error| storage("decode attendee count", &e);
        Ok(CountChange {
            previous: from_column("previous", row.try_get("previous").map_err(decode)?)?,
            current: from_column(
                "current_attendees",
                row.try_get("current_attendees").map_err(decode)?,
            )?,
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
        // The second branch matches a replay of a write that already landed.
        let result = sqlx::query(
            "UPDATE waitlist_entrants SET status = $4, write_id = $5, updated_at = NOW() \
             WHERE event_id = $1 AND user_id = $2 \
             AND (status = $3 OR (status = $4 AND write_id = $5))",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(expected.as_str())
        .bind(status.as_str())
        .bind(write_id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage("write entrant status", &e))?;

        if result.rows_affected() == 1 {
            return Ok(StatusWrite::Written);
        }

        match self.fetch_entrant(event_id, user_id).await? {
            Some(actual) => Ok(StatusWrite::Conflict(actual.status)),
            None => Err(DomainError::EntrantNotFound {
                event_id,
                user_id: user_id.to_owned(),
            }),
        }
    }
}
