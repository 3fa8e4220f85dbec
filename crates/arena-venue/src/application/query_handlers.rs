//! Query handlers for the Location Registry context.

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::aggregate::AggregateRoot;
use arena_core::error::DomainError;
use arena_core::repository::EventRepository;
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_location, reconstitute};
use crate::domain::aggregates::Location;
use crate::domain::events::LOCATION_REGISTERED_EVENT_TYPE;

/// Read-only view of a location aggregate.
#[derive(Debug, Serialize)]
pub struct LocationView {
    /// The location identifier.
    pub location_id: Uuid,
    /// Display name.
    pub name: String,
    /// Whether the location accepts new sessions.
    pub active: bool,
    /// Currently assigned template, if any.
    pub assigned_template_id: Option<Uuid>,
    /// Assigned template's name at assignment time.
    pub template_name: Option<String>,
    /// Assigned template's mode at assignment time.
    pub mode: Option<ParticipationMode>,
    /// Sessions at this location that are still Active.
    pub active_session_ids: Vec<Uuid>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Location> for LocationView {
    fn from(location: &Location) -> Self {
        let assigned = location.assigned_template();
        Self {
            location_id: location.id,
            name: location.name().to_owned(),
            active: location.is_active(),
            assigned_template_id: assigned.map(|t| t.template_id),
            template_name: assigned.map(|t| t.name.clone()),
            mode: assigned.map(|t| t.mode),
            active_session_ids: location.open_sessions().iter().copied().collect(),
            version: location.version(),
        }
    }
}

/// Retrieves a location by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no location has the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_location_by_id(
    location_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<LocationView, DomainError> {
    let location = load_location(location_id, repo).await?;
    Ok(LocationView::from(&location))
}

/// Lists every registered location, oldest first.
///
/// # Errors
///
/// Returns the repository's error if listing or loading fails.
pub async fn list_locations(repo: &dyn EventRepository) -> Result<Vec<LocationView>, DomainError> {
    let ids = repo
        .list_aggregate_ids(LOCATION_REGISTERED_EVENT_TYPE)
        .await?;
    let mut views = Vec::with_capacity(ids.len());
    for location_id in ids {
        let stored_events = repo.load_events(location_id).await?;
        let location = reconstitute(location_id, &stored_events)?;
        views.push(LocationView::from(&location));
    }
    Ok(views)
}
