//! Test repositories: mock `EventRepository` implementations for tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use arena_core::error::DomainError;
use arena_core::repository::{EventRepository, StoredEvent, StreamAppend};
use async_trait::async_trait;
use uuid::Uuid;

/// An event repository that records all `append_events` and `append_batch`
/// calls. Returns the configured events from `load_events` on every call and
/// always succeeds on appends.
#[derive(Debug)]
pub struct RecordingEventRepository {
    load_result: Mutex<Vec<StoredEvent>>,
    appended: Mutex<Vec<(Uuid, i64, Vec<StoredEvent>)>>,
}

impl RecordingEventRepository {
    /// Create a new recording repository that will return `load_result` from
    /// every `load_events` call.
    ///
    /// # Panics
    ///
    /// Panics if `load_result` is an `Err`; use `FailingEventRepository` for
    /// error scenarios.
    #[must_use]
    pub fn new(load_result: Result<Vec<StoredEvent>, DomainError>) -> Self {
        Self {
            load_result: Mutex::new(load_result.expect(
                "RecordingEventRepository::new does not accept Err; use FailingEventRepository",
            )),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Returns a snapshot of all events that were appended, one entry per
    /// stream. Batches are flattened into their per-stream entries.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<(Uuid, i64, Vec<StoredEvent>)> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventRepository for RecordingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self.load_result.lock().unwrap().clone())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id, expected_version, events.to_vec()));
        Ok(())
    }

    async fn append_batch(&self, batch: &[StreamAppend]) -> Result<(), DomainError> {
        let mut appended = self.appended.lock().unwrap();
        for append in batch {
            appended.push((
                append.aggregate_id,
                append.expected_version,
                append.events.clone(),
            ));
        }
        Ok(())
    }

    async fn list_aggregate_ids(&self, _event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        let events = self.load_result.lock().unwrap();
        let mut ids: Vec<Uuid> = Vec::new();
        for event in events.iter() {
            if !ids.contains(&event.aggregate_id) {
                ids.push(event.aggregate_id);
            }
        }
        Ok(ids)
    }
}

/// An event repository that always returns an empty event list and silently
/// accepts appends. Useful for testing "aggregate not found" scenarios and
/// creation commands.
#[derive(Debug)]
pub struct EmptyEventRepository;

#[async_trait]
impl EventRepository for EmptyEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(vec![])
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Ok(())
    }

    async fn append_batch(&self, _batch: &[StreamAppend]) -> Result<(), DomainError> {
        Ok(())
    }

    async fn list_aggregate_ids(&self, _event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        Ok(vec![])
    }
}

/// An event repository that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventRepository;

#[async_trait]
impl EventRepository for FailingEventRepository {
    async fn load_events(&self, _aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: Uuid,
        _expected_version: i64,
        _events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn append_batch(&self, _batch: &[StreamAppend]) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }

    async fn list_aggregate_ids(&self, _event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        Err(DomainError::Infrastructure("connection refused".into()))
    }
}

/// An in-process event store with real optimistic concurrency: appends are
/// rejected when the stream has moved past `expected_version`, and batches
/// are applied all-or-nothing. Used for multi-step scenario tests.
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    log: Mutex<Vec<StoredEvent>>,
}

impl InMemoryEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored across all streams.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn event_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn version_of(log: &[StoredEvent], aggregate_id: Uuid) -> i64 {
        log.iter()
            .filter(|event| event.aggregate_id == aggregate_id)
            .count() as i64
    }

    fn check(log: &[StoredEvent], append: &StreamAppend) -> Result<(), DomainError> {
        let actual = Self::version_of(log, append.aggregate_id);
        if actual == append.expected_version {
            Ok(())
        } else {
            Err(DomainError::ConcurrencyConflict {
                aggregate_id: append.aggregate_id,
                expected: append.expected_version,
                actual,
            })
        }
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        Ok(self
            .log
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        self.append_batch(&[StreamAppend::new(
            aggregate_id,
            expected_version,
            events.to_vec(),
        )])
        .await
    }

    async fn append_batch(&self, batch: &[StreamAppend]) -> Result<(), DomainError> {
        let mut log = self.log.lock().unwrap();
        for append in batch {
            Self::check(&log, append)?;
        }
        for append in batch {
            log.extend(append.events.iter().cloned());
        }
        Ok(())
    }

    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        let log = self.log.lock().unwrap();
        let mut ids: Vec<Uuid> = Vec::new();
        for event in log.iter().filter(|event| event.event_type == event_type) {
            if !ids.contains(&event.aggregate_id) {
                ids.push(event.aggregate_id);
            }
        }
        Ok(ids)
    }
}

/// An `InMemoryEventRepository` that yields to the scheduler after every
/// load. Handlers joined on one task then interleave between their reads
/// and their conditional appends, as they would against a shared database.
///
/// Appends rejected for a stale expected version are counted.
#[derive(Debug, Default)]
pub struct InterleavingEventRepository {
    inner: InMemoryEventRepository,
    conflicts: AtomicUsize,
}

impl InterleavingEventRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many appends failed with `ConcurrencyConflict`.
    pub fn concurrency_conflicts(&self) -> usize {
        self.conflicts.load(Ordering::SeqCst)
    }

    fn observe(&self, result: Result<(), DomainError>) -> Result<(), DomainError> {
        if matches!(result, Err(DomainError::ConcurrencyConflict { .. })) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

#[async_trait]
impl EventRepository for InterleavingEventRepository {
    async fn load_events(&self, aggregate_id: Uuid) -> Result<Vec<StoredEvent>, DomainError> {
        let events = self.inner.load_events(aggregate_id).await?;
        tokio::task::yield_now().await;
        Ok(events)
    }

    async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: &[StoredEvent],
    ) -> Result<(), DomainError> {
        let result = self
            .inner
            .append_events(aggregate_id, expected_version, events)
            .await;
        self.observe(result)
    }

    async fn append_batch(&self, batch: &[StreamAppend]) -> Result<(), DomainError> {
        let result = self.inner.append_batch(batch).await;
        self.observe(result)
    }

    async fn list_aggregate_ids(&self, event_type: &str) -> Result<Vec<Uuid>, DomainError> {
        self.inner.list_aggregate_ids(event_type).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(aggregate_id: Uuid, sequence_number: i64, event_type: &str) -> StoredEvent {
        StoredEvent {
            event_id: Uuid::new_v4(),
            aggregate_id,
            event_type: event_type.to_owned(),
            payload: serde_json::json!({}),
            sequence_number,
            correlation_id: Uuid::new_v4(),
            causation_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_rejects_stale_expected_version() {
        let repo = InMemoryEventRepository::new();
        let id = Uuid::new_v4();
        repo.append_events(id, 0, &[event(id, 1, "sample.a")])
            .await
            .unwrap();

        let result = repo.append_events(id, 0, &[event(id, 1, "sample.a")]).await;

        match result {
            Err(DomainError::ConcurrencyConflict {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected ConcurrencyConflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_in_memory_batch_is_all_or_nothing() {
        let repo = InMemoryEventRepository::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        repo.append_events(b, 0, &[event(b, 1, "sample.a")])
            .await
            .unwrap();

        let result = repo
            .append_batch(&[
                StreamAppend::new(a, 0, vec![event(a, 1, "sample.a")]),
                StreamAppend::new(b, 0, vec![event(b, 2, "sample.a")]),
            ])
            .await;

        assert!(result.is_err());
        assert!(repo.load_events(a).await.unwrap().is_empty());
        assert_eq!(repo.event_count(), 1);
    }

    #[tokio::test]
    async fn test_in_memory_lists_ids_by_event_type_in_first_seen_order() {
        let repo = InMemoryEventRepository::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        repo.append_events(b, 0, &[event(b, 1, "sample.a")])
            .await
            .unwrap();
        repo.append_events(a, 0, &[event(a, 1, "sample.b")])
            .await
            .unwrap();
        repo.append_events(a, 1, &[event(a, 2, "sample.a")])
            .await
            .unwrap();

        let ids = repo.list_aggregate_ids("sample.a").await.unwrap();

        assert_eq!(ids, vec![b, a]);
    }

    #[tokio::test]
    async fn test_interleaving_store_counts_rejected_appends() {
        let repo = InterleavingEventRepository::new();
        let id = Uuid::new_v4();
        repo.append_events(id, 0, &[event(id, 1, "sample.a")])
            .await
            .unwrap();

        let (first, second) = tokio::join!(repo.load_events(id), repo.load_events(id));
        let stale = repo.append_events(id, 0, &[event(id, 2, "sample.a")]).await;

        assert_eq!(first.unwrap().len(), 1);
        assert_eq!(second.unwrap().len(), 1);
        assert!(matches!(stale, Err(DomainError::ConcurrencyConflict { .. })));
        assert_eq!(repo.concurrency_conflicts(), 1);
    }
}
