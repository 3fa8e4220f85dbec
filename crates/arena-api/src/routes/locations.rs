//! Routes for the Location Registry bounded context.
//!
//! Starting a session is addressed through its location since it writes
//! both streams.

use arena_core::command::Command;
use arena_session::application::command_handlers as session_handlers;
use arena_session::domain::commands::StartSession;
use arena_venue::application::command_handlers;
use arena_venue::application::query_handlers::{self, LocationView};
use arena_venue::domain::commands;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /locations.
#[derive(Debug, Deserialize)]
pub struct RegisterLocationRequest {
    /// Display name of the venue.
    pub name: String,
}

/// Request body for POST /locations/{id}/assign-template.
#[derive(Debug, Deserialize)]
pub struct AssignTemplateRequest {
    /// The template to assign.
    pub template_id: Uuid,
}

/// POST /locations
#[instrument(skip(state, request))]
async fn register_location(
    State(state): State<AppState>,
    Json(request): Json<RegisterLocationRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RegisterLocation {
        correlation_id: Uuid::new_v4(),
        name: request.name,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_register_location(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    )))
}

/// POST /locations/{id}/activate
#[instrument(skip(state))]
async fn activate_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ActivateLocation {
        correlation_id: Uuid::new_v4(),
        location_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_activate_location(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    )))
}

/// POST /locations/{id}/deactivate
#[instrument(skip(state))]
async fn deactivate_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::DeactivateLocation {
        correlation_id: Uuid::new_v4(),
        location_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_deactivate_location(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    )))
}

/// POST /locations/{id}/assign-template
#[instrument(skip(state, request), fields(template_id = %request.template_id))]
async fn assign_template(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
    Json(request): Json<AssignTemplateRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AssignTemplate {
        correlation_id: Uuid::new_v4(),
        location_id,
        template_id: request.template_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_assign_template(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    )))
}

/// POST /locations/{id}/start-session
///
/// Responds with the new session's id as `aggregate_id`.
#[instrument(skip(state))]
async fn start_session(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = StartSession {
        correlation_id: Uuid::new_v4(),
        location_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = session_handlers::handle_start_session(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    )))
}

/// GET /locations/{id}
async fn get_location(
    State(state): State<AppState>,
    Path(location_id): Path<Uuid>,
) -> Result<Json<LocationView>, ApiError> {
    let view = query_handlers::get_location_by_id(location_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /locations
async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<LocationView>>, ApiError> {
    let views = query_handlers::list_locations(&*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the venue context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_location).get(list_locations))
        .route("/{id}", get(get_location))
        .route("/{id}/activate", post(activate_location))
        .route("/{id}/deactivate", post(deactivate_location))
        .route("/{id}/assign-template", post(assign_template))
        .route("/{id}/start-session", post(start_session))
}
