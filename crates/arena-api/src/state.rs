//! Shared application state.

use std::sync::Arc;

use arena_core::clock::Clock;
use arena_core::notification::ForfeitNotifier;
use arena_core::repository::EventRepository;
use sqlx::PgPool;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub db_pool: PgPool,
    /// Source of "now" for every command.
    pub clock: Arc<dyn Clock>,
    /// The event store.
    pub event_repository: Arc<dyn EventRepository>,
    /// Channel for forfeit warnings.
    pub notifier: Arc<dyn ForfeitNotifier>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        db_pool: PgPool,
        clock: Arc<dyn Clock>,
        event_repository: Arc<dyn EventRepository>,
        notifier: Arc<dyn ForfeitNotifier>,
    ) -> Self {
        Self {
            db_pool,
            clock,
            event_repository,
            notifier,
        }
    }
}
