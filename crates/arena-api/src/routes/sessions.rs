//! Routes for the Game Session bounded context.

use arena_core::command::Command;
use arena_session::application::command_handlers::{self, SessionCommandResult};
use arena_session::application::query_handlers::{self, SessionFilter, SessionView};
use arena_session::domain::commands;
use arena_session::domain::outcome::{OutcomeValue, SessionStatus};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Query string for GET /sessions.
#[derive(Debug, Default, Deserialize)]
pub struct ListSessionsQuery {
    /// `active`, `completed` or `cancelled`.
    pub status: Option<String>,
    /// Restrict to one location.
    pub location_id: Option<Uuid>,
    /// Restrict to one template.
    pub template_id: Option<Uuid>,
}

impl ListSessionsQuery {
    fn into_filter(self) -> Result<SessionFilter, ApiError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<SessionStatus>)
            .transpose()?;
        Ok(SessionFilter {
            status,
            location_id: self.location_id,
            template_id: self.template_id,
        })
    }
}

/// Request body for POST /sessions/{id}/participants.
#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    /// The player joining the roster.
    pub player_id: Uuid,
}

/// Request body for POST /sessions/{id}/draft-outcome.
#[derive(Debug, Deserialize)]
pub struct DraftOutcomeRequest {
    /// The staged uniform result.
    pub value: OutcomeValue,
}

/// Request body for POST /sessions/{id}/participant-outcome.
#[derive(Debug, Deserialize)]
pub struct ParticipantOutcomeRequest {
    /// The player the result is for.
    pub player_id: Uuid,
    /// The staged result.
    pub value: OutcomeValue,
}

/// Request body for POST /sessions/{id}/media.
#[derive(Debug, Deserialize)]
pub struct AttachMediaRequest {
    /// Reference to externally stored media.
    pub external_media_ref: String,
}

fn respond(result: &SessionCommandResult) -> Json<CommandResponse> {
    Json(CommandResponse::new(
        result.aggregate_id,
        &result.stored_events,
    ))
}

/// POST /sessions/{id}/participants
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn add_participant(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AddParticipantRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AddParticipant {
        correlation_id: Uuid::new_v4(),
        session_id,
        player_id: request.player_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_add_participant(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/participants/{participant_id}/remove
#[instrument(skip(state))]
async fn remove_participant(
    State(state): State<AppState>,
    Path((session_id, participant_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RemoveParticipant {
        correlation_id: Uuid::new_v4(),
        session_id,
        participant_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_remove_participant(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/draft-outcome
#[instrument(skip(state, request), fields(value = ?request.value))]
async fn set_draft_outcome(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<DraftOutcomeRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetDraftOutcome {
        correlation_id: Uuid::new_v4(),
        session_id,
        value: request.value,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_set_draft_outcome(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/participant-outcome
#[instrument(skip(state, request), fields(player_id = %request.player_id))]
async fn set_participant_outcome(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ParticipantOutcomeRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::SetParticipantOutcome {
        correlation_id: Uuid::new_v4(),
        session_id,
        player_id: request.player_id,
        value: request.value,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_set_participant_outcome(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/clear-draft
#[instrument(skip(state))]
async fn clear_draft_outcome(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ClearDraftOutcome {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_clear_draft_outcome(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/confirm
#[instrument(skip(state))]
async fn confirm_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ConfirmSession {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_confirm_session(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/cancel
#[instrument(skip(state))]
async fn cancel_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::CancelSession {
        correlation_id: Uuid::new_v4(),
        session_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_cancel_session(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// POST /sessions/{id}/media
#[instrument(skip(state, request))]
async fn attach_media(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AttachMediaRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::AttachMedia {
        correlation_id: Uuid::new_v4(),
        session_id,
        external_media_ref: request.external_media_ref,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_attach_media(
        &command,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;

    Ok(respond(&result))
}

/// GET /sessions/{id}
async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_by_id(session_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /sessions
async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Json<Vec<SessionView>>, ApiError> {
    let filter = query.into_filter()?;
    let views = query_handlers::list_sessions(filter, &*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the session context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sessions))
        .route("/{id}", get(get_session))
        .route("/{id}/participants", post(add_participant))
        .route(
            "/{id}/participants/{participant_id}/remove",
            post(remove_participant),
        )
        .route("/{id}/draft-outcome", post(set_draft_outcome))
        .route("/{id}/participant-outcome", post(set_participant_outcome))
        .route("/{id}/clear-draft", post(clear_draft_outcome))
        .route("/{id}/confirm", post(confirm_session))
        .route("/{id}/cancel", post(cancel_session))
        .route("/{id}/media", post(attach_media))
}
