//! Routes for the Template Catalog bounded context.

use arena_catalog::application::command_handlers;
use arena_catalog::application::query_handlers::{self, TemplateView};
use arena_catalog::domain::commands;
use arena_catalog::domain::participation::ParticipationMode;
use arena_core::command::Command;
use arena_session::application::template_usage::StoreTemplateUsage;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /templates and POST /templates/{id}/update.
#[derive(Debug, Deserialize)]
pub struct TemplateRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// How the template's sessions are played.
    pub mode: ParticipationMode,
}

/// POST /templates
#[instrument(skip(state, request), fields(mode = %request.mode))]
async fn create_template(
    State(state): State<AppState>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CreateTemplate {
        correlation_id: Uuid::new_v4(),
        name: request.name,
        description: request.description,
        mode: request.mode,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_create_template(
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

/// POST /templates/{id}/update
#[instrument(skip(state, request))]
async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
    Json(request): Json<TemplateRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::UpdateTemplate {
        correlation_id: Uuid::new_v4(),
        template_id,
        name: request.name,
        description: request.description,
        mode: request.mode,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_update_template(
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

/// POST /templates/{id}/retire
#[instrument(skip(state))]
async fn retire_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RetireTemplate {
        correlation_id: Uuid::new_v4(),
        template_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let usage = StoreTemplateUsage::new(state.event_repository.as_ref());
    let result = command_handlers::handle_retire_template(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
        &usage,
    )
    .await?;

    Ok(Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    )))
}

/// GET /templates/{id}
async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<TemplateView>, ApiError> {
    let view = query_handlers::get_template_by_id(template_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /templates
async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateView>>, ApiError> {
    let views = query_handlers::list_templates(&*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the catalog context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_template).get(list_templates))
        .route("/{id}", get(get_template))
        .route("/{id}/update", post(update_template))
        .route("/{id}/retire", post(retire_template))
}
