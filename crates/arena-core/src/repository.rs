//! Event repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;

/// Stored representation of a domain event.
#[derive(Debug, Clone)]
pub struct StoredEvent {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Aggregate this event belongs to.
    pub aggregate_id: Uuid,
    /// Event type name for deserialization routing.
    pub event_type: String,
    /// Serialized event payload.
    pub payload: serde_json::Value,
    /// Sequence number within the aggregate stream.
    pub sequence_number: i64,
    /// Correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Causation ID linking to the causing event/command.
    pub causation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: chrono::DateTime<chrono::Utc>,
}

/// One stream's share of an atomic multi-stream append.
#[derive(Debug, Clone)]
pub struct StreamAppend {
    /// The stream to append to.
    pub aggregate_id: Uuid,
    /// The last sequence number the caller observed for this stream.
    pub expected_version: i64,
    /// Events to append. May be empty, in which case the entry only asserts
    /// the stream's version.
    pub events: Vec<StoredEvent>,
}

impl StreamAppend {
    /// Creates a new stream append.
    #[must_use]
    pub fn new(aggregate_id: Uuid, expected_version: i64, events: Vec<StoredEvent>) -> Self {
        Self {
            aggregate_id,
            expected_version,
            events,
        }
    }
}

/// Repository trait for loading and appending domain events.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Load all events for a given aggregate, ordered by sequence number.
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    /// `expected_version` is the last known sequence number.
    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError>;

    /// Append to several streams atomically. Every stream's expected version
    /// is checked; either all events are written or none are.
    async fn append_batch(&self, batch: &[StreamAppend]) -> Result<(), DomainError>;

    /// Returns the IDs of every aggregate whose stream contains an event of
    /// the given type, in order of first appearance.
    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError>;
}
