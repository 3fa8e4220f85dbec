//! `PostgreSQL` implementation of the `EventRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use arena_core::error::DomainError;
use arena_core::repository::{EventRepository, StoredEvent, StreamAppend};

/// PostgreSQL-backed event repository.
#[derive(Debug, Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    /// Creates a new `PgEventRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infrastructure(err: &sqlx::Error) -> DomainError {
    DomainError::Infrastructure(err.to_string())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

fn row_to_stored_event(row: &PgRow) -> Result<StoredEvent, sqlx::Error> {
    Ok(StoredEvent {
        event_id: row.try_get::<Uuid, _>("event_id")?,
        aggregate_id: row.try_get::<Uuid, _>("aggregate_id")?,
        event_type: row.try_get::<String, _>("event_type")?,
        payload: row.try_get::<serde_json::Value, _>("payload")?,
        sequence_number: row.try_get::<i64, _>("sequence_number")?,
        correlation_id: row.try_get::<Uuid, _>("correlation_id")?,
        causation_id: row.try_get::<Uuid, _>("causation_id")?,
        occurred_at: row.try_get::<DateTime<Utc>, _>("occurred_at")?,
    })
}

/// Serializes writers on one stream for the rest of the transaction.
async fn lock_stream(conn: &mut PgConnection, aggregate_id: Uuid) -> Result<(), DomainError> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
        .bind(aggregate_id)
        .execute(&mut *conn)
        .await
        .map_err(|e| infrastructure(&e))?;
    Ok(())
}

async fn current_version(conn: &mut PgConnection, aggregate_id: Uuid) -> Result<i64, DomainError> {
    let row = sqlx::query(
        "SELECT COALESCE(MAX(sequence_number), 0) AS version FROM domain_events WHERE aggregate_id = $1",
    )
    .bind(aggregate_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| infrastructure(&e))?;
    row.try_get::<i64, _>("version")
        .map_err(|e| infrastructure(&e))
}

/// Checks the stream version and inserts the events inside an open
/// transaction. The caller must already hold the stream lock.
async fn append_locked(
    conn: &mut PgConnection,
    aggregate_id: Uuid,
    expected_version: i64,
    events: &[StoredEvent],
) -> Result<(), DomainError> {
    let actual = current_version(conn, aggregate_id).await?;
    if actual != expected_version {
        warn!(%aggregate_id, expected_version, actual, "stale expected version");
        return Err(DomainError::ConcurrencyConflict {
            aggregate_id,
            expected: expected_version,
            actual,
        });
    }

    for event in events {
        let inserted = sqlx::query(
            "INSERT INTO domain_events \
             (event_id, aggregate_id, event_type, payload, sequence_number, correlation_id, causation_id, occurred_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(event.event_id)
        .bind(aggregate_id)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.sequence_number)
        .bind(event.correlation_id)
        .bind(event.causation_id)
        .bind(event.occurred_at)
        .execute(&mut *conn)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(DomainError::ConcurrencyConflict {
                    aggregate_id,
                    expected: expected_version,
                    actual: event.sequence_number,
                });
            }
            return Err(infrastructure(&e));
        }
    }
    Ok(())
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let rows = sqlx::query(
            "SELECT event_id, aggregate_id, event_type, payload, sequence_number, \
             correlation_id, causation_id, occurred_at \
             FROM domain_events WHERE aggregate_id = $1 ORDER BY sequence_number",
        )
        .bind(aggregate_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        rows.iter()
            .map(|row| row_to_stored_event(row).map_err(|e| infrastructure(&e)))
            .collect()
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(|e| infrastructure(&e))?;
        lock_stream(&mut tx, aggregate_id).await?;
        append_locked(&mut tx, aggregate_id, expected_version, events).await?;
        tx.commit().await.map_err(|e| infrastructure(&e))?;

        debug!(%aggregate_id, count = events.len(), "appended events");
        Ok(())
    }

    async fn append_batch(&self, batch: &[StreamAppend]) -> Result<(), DomainError> {
        if batch.is_empty() {
            return Ok(());
        }

        // Lock in a stable order so two batches over the same streams
        // cannot deadlock.
        let mut stream_ids: Vec<Uuid> = batch.iter().map(|s| s.aggregate_id).collect();
        stream_ids.sort_unstable();
        stream_ids.dedup();

        let mut tx = self.pool.begin().await.map_err(|e| infrastructure(&e))?;
        for aggregate_id in &stream_ids {
            lock_stream(&mut tx, *aggregate_id).await?;
        }
        for append in batch {
            append_locked(
                &mut tx,
                append.aggregate_id,
                append.expected_version,
                &append.events,
            )
            .await?;
        }
        tx.commit().await.map_err(|e| infrastructure(&e))?;

        debug!(streams = stream_ids.len(), "appended batch");
        Ok(())
    }

    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        let rows = sqlx::query(
            "SELECT aggregate_id FROM domain_events WHERE event_type = $1 \
             GROUP BY aggregate_id ORDER BY MIN(position)",
        )
        .bind(event_type)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| infrastructure(&e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Uuid, _>("aggregate_id")
                    .map_err(|e| infrastructure(&e))
            })
            .collect()
    }
}
