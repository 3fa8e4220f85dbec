//! Route modules organized by bounded context.

use arena_core::repository::StoredEvent;
use axum::Router;
use serde::Serialize;
use uuid::Uuid;

use crate::state::AppState;

pub mod health;
pub mod locations;
pub mod players;
pub mod sessions;
pub mod templates;

/// Response body returned after a command is successfully handled.
#[derive(Debug, Serialize)]
pub struct CommandResponse {
    /// The aggregate the command targeted or created.
    pub aggregate_id: Uuid,
    /// IDs of the domain events produced and persisted.
    pub event_ids: Vec<Uuid>,
}

impl CommandResponse {
    fn new(aggregate_id: Uuid, stored_events: &[StoredEvent]) -> Self {
        Self {
            aggregate_id,
            event_ids: stored_events.iter().map(|e| e.event_id).collect(),
        }
    }
}

/// The full route tree, without middleware or state.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/templates", templates::router())
        .nest("/api/v1/locations", locations::router())
        .nest("/api/v1/sessions", sessions::router())
        .nest("/api/v1/players", players::router())
}
