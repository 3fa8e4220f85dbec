//! Command handlers for the Location Registry context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use arena_catalog::application::command_handlers::load_template;
use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::{EventMetadata, decode_payload};
use arena_core::repository::{EventRepository, StoredEvent, StreamAppend};
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::{AssignedTemplate, Location};
use crate::domain::commands::{
    ActivateLocation, AssignTemplate, DeactivateLocation, RegisterLocation,
};
use crate::domain::events::{VenueEvent, VenueEventKind};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct VenueCommandResult {
    /// The aggregate ID affected or created by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `Location` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    location_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Location, DomainError> {
    let mut location = Location::new(location_id);
    for stored in existing_events {
        let kind: VenueEventKind = decode_payload(stored)?;
        let event = VenueEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        location.apply(&event);
    }
    Ok(location)
}

/// Loads a registered location from the store.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no location has the ID, or the
/// repository's error if loading fails.
pub async fn load_location(
    location_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Location, DomainError> {
    let existing_events = repo.load_events(location_id).await?;
    let location = reconstitute(location_id, &existing_events)?;
    if !location.is_registered() {
        return Err(DomainError::AggregateNotFound(location_id));
    }
    Ok(location)
}

async fn persist(
    location: &Location,
    repo: &dyn EventRepository,
) -> Result<VenueCommandResult, DomainError> {
    let stored_events = location.stored_uncommitted_events();
    repo.append_events(location.id, location.version(), &stored_events)
        .await?;
    Ok(VenueCommandResult {
        aggregate_id: location.id,
        stored_events,
    })
}

/// Handles the `RegisterLocation` command.
///
/// This is a CREATION command; the handler generates the `location_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank name, or the repository's
/// error if appending fails.
pub async fn handle_register_location(
    command: &RegisterLocation,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VenueCommandResult, DomainError> {
    let mut location = Location::new(Uuid::new_v4());
    location.register(&command.name, command.correlation_id, clock)?;
    let result = persist(&location, repo).await?;
    info!(location_id = %location.id, "location registered");
    Ok(result)
}

/// Handles the `ActivateLocation` command.
///
/// A location with a template assigned also records a reference on the
/// template stream in the same write, so the template cannot be retired
/// underneath it.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown location,
/// `DomainError::Precondition` if the assigned template has been retired,
/// or the repository's error if loading or appending fails.
pub async fn handle_activate_location(
    command: &ActivateLocation,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VenueCommandResult, DomainError> {
    let mut location = load_location(command.location_id, repo).await?;
    location.activate(command.correlation_id, clock)?;

    let Some(template_id) = location.assigned_template().map(|t| t.template_id) else {
        return persist(&location, repo).await;
    };
    let mut template = match load_template(template_id, repo).await {
        Ok(template) => template,
        Err(DomainError::AggregateNotFound(_)) => {
            return Err(DomainError::Precondition(format!(
                "template {template_id} assigned to location {} has been retired",
                command.location_id
            )));
        }
        Err(e) => return Err(e),
    };
    template.record_reference(location.id, command.correlation_id, clock)?;

    let stored_events = location.stored_uncommitted_events();
    repo.append_batch(&[
        StreamAppend::new(location.id, location.version(), stored_events.clone()),
        StreamAppend::new(
            template.id,
            template.version(),
            template.stored_uncommitted_events(),
        ),
    ])
    .await?;

    Ok(VenueCommandResult {
        aggregate_id: location.id,
        stored_events,
    })
}

/// Handles the `DeactivateLocation` command.
///
/// The append is conditional on the version the open-session check was made
/// against, so a session started concurrently turns this into a conflict.
///
/// # Errors
///
/// Returns `DomainError::Conflict` while a session is Active at the
/// location, `DomainError::AggregateNotFound` for an unknown location, or
/// the repository's error if loading or appending fails.
pub async fn handle_deactivate_location(
    command: &DeactivateLocation,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VenueCommandResult, DomainError> {
    let mut location = load_location(command.location_id, repo).await?;
    location.deactivate(command.correlation_id, clock)?;
    let result = persist(&location, repo).await?;
    info!(location_id = %command.location_id, "location deactivated");
    Ok(result)
}

/// Handles the `AssignTemplate` command: the template must exist and not be
/// retired. A `TemplateReferenced` event is appended to the template stream
/// in the same atomic write, so whichever of this and a concurrent
/// retirement lands second fails its version check.
///
/// # Errors
///
/// Returns `DomainError::Conflict` while a session is Active at the
/// location, `DomainError::AggregateNotFound` for an unknown location or
/// template, or the repository's error if loading or appending fails.
pub async fn handle_assign_template(
    command: &AssignTemplate,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<VenueCommandResult, DomainError> {
    let mut location = load_location(command.location_id, repo).await?;
    let mut template = load_template(command.template_id, repo).await?;
    let mode = template
        .mode()
        .ok_or(DomainError::AggregateNotFound(command.template_id))?;

    location.assign_template(
        AssignedTemplate {
            template_id: command.template_id,
            name: template.name().to_owned(),
            mode,
        },
        command.correlation_id,
        clock,
    )?;
    template.record_reference(location.id, command.correlation_id, clock)?;

    let stored_events = location.stored_uncommitted_events();
    repo.append_batch(&[
        StreamAppend::new(location.id, location.version(), stored_events.clone()),
        StreamAppend::new(
            template.id,
            template.version(),
            template.stored_uncommitted_events(),
        ),
    ])
    .await?;

    info!(
        location_id = %command.location_id,
        template_id = %command.template_id,
        "template assigned"
    );

    Ok(VenueCommandResult {
        aggregate_id: location.id,
        stored_events,
    })
}
