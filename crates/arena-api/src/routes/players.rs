//! Routes for the Player Standing bounded context.

use arena_core::command::Command;
use arena_standing::application::command_handlers;
use arena_standing::application::forfeit_scan::{self, ScanReport};
use arena_standing::application::query_handlers::{self, PlayerView, StandingView};
use arena_standing::domain::commands;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::routes::CommandResponse;
use crate::state::AppState;

/// Request body for POST /players.
#[derive(Debug, Deserialize)]
pub struct RegisterPlayerRequest {
    /// Display name shown on rosters and results.
    pub username: String,
}

/// POST /players
#[instrument(skip(state, request))]
async fn register_player(
    State(state): State<AppState>,
    Json(request): Json<RegisterPlayerRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::RegisterPlayer {
        correlation_id: Uuid::new_v4(),
        username: request.username,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_register_player(
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

/// POST /players/{id}/reinstate
#[instrument(skip(state))]
async fn reinstate_player(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ReinstatePlayer {
        correlation_id: Uuid::new_v4(),
        player_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_reinstate_player(
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

/// POST /players/{id}/forfeit
#[instrument(skip(state))]
async fn forfeit_player(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<CommandResponse>, ApiError> {
    let command = commands::ForfeitPlayer {
        correlation_id: Uuid::new_v4(),
        player_id,
    };

    info!(
        correlation_id = %command.correlation_id,
        command_type = command.command_type(),
        "handling command"
    );

    let result = command_handlers::handle_forfeit_player(
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

/// POST /players/forfeit-scan
#[instrument(skip(state))]
async fn run_forfeit_scan(State(state): State<AppState>) -> Result<Json<ScanReport>, ApiError> {
    let report = forfeit_scan::scan_standings(
        state.clock.as_ref(),
        &*state.event_repository,
        state.notifier.as_ref(),
    )
    .await?;
    Ok(Json(report))
}

/// GET /players/{id}
async fn get_player(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<PlayerView>, ApiError> {
    let view = query_handlers::get_player_by_id(player_id, &*state.event_repository).await?;
    Ok(Json(view))
}

/// GET /players/{id}/standing
async fn get_standing(
    State(state): State<AppState>,
    Path(player_id): Path<Uuid>,
) -> Result<Json<StandingView>, ApiError> {
    let view = query_handlers::get_player_standing(
        player_id,
        state.clock.as_ref(),
        &*state.event_repository,
    )
    .await?;
    Ok(Json(view))
}

/// GET /players
async fn list_players(State(state): State<AppState>) -> Result<Json<Vec<PlayerView>>, ApiError> {
    let views = query_handlers::list_players(&*state.event_repository).await?;
    Ok(Json(views))
}

/// Returns the router for the standing context.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register_player).get(list_players))
        .route("/forfeit-scan", post(run_forfeit_scan))
        .route("/{id}", get(get_player))
        .route("/{id}/standing", get(get_standing))
        .route("/{id}/reinstate", post(reinstate_player))
        .route("/{id}/forfeit", post(forfeit_player))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_helpers::{app_state_with, app_state_with_notifier, send};
    use arena_core::notification::ForfeitNotifier;
    use arena_core::repository::EventRepository;
    use arena_test_support::{
        EmptyEventRepository, FailingEventRepository, FailingNotifier, InMemoryEventRepository,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    fn app(repo: Arc<dyn EventRepository>) -> Router {
        router().with_state(app_state_with(repo))
    }

    async fn register(repo: &Arc<dyn EventRepository>, username: &str) -> String {
        let (status, json) = send(
            app(repo.clone()),
            "POST",
            "/",
            Some(json!({ "username": username })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        json["aggregate_id"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_register_and_get_player() {
        // Arrange
        let repo: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
        let player_id = register(&repo, "alice").await;

        // Act
        let (status, view) = send(app(repo.clone()), "GET", &format!("/{player_id}"), None).await;
        let (_, listed) = send(app(repo), "GET", "/", None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["username"], "alice");
        assert_eq!(view["global_status"], "active");
        assert!(view["last_session_at"].is_null());
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_player_with_blank_username_returns_400() {
        let app = app(Arc::new(EmptyEventRepository));

        let (status, json) = send(app, "POST", "/", Some(json!({ "username": "" }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_standing_of_player_without_sessions_is_not_eligible() {
        let repo: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
        let player_id = register(&repo, "alice").await;

        let (status, view) =
            send(app(repo), "GET", &format!("/{player_id}/standing"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["forfeit_eligible"], false);
        assert_eq!(view["approaching_forfeit"], false);
        assert!(view["hours_since_last_session"].is_null());
    }

    #[tokio::test]
    async fn test_forfeit_of_ineligible_player_returns_422() {
        let repo: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
        let player_id = register(&repo, "alice").await;

        let (status, json) =
            send(app(repo), "POST", &format!("/{player_id}/forfeit"), None).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"], "precondition_failed");
    }

    #[tokio::test]
    async fn test_reinstate_active_player_writes_no_events() {
        let repo: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
        let player_id = register(&repo, "alice").await;

        let (status, json) =
            send(app(repo), "POST", &format!("/{player_id}/reinstate"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["aggregate_id"], player_id.as_str());
        assert!(json["event_ids"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forfeit_scan_with_fresh_players_reports_nothing() {
        // Arrange
        let repo: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
        register(&repo, "alice").await;
        let notifier: Arc<dyn ForfeitNotifier> = Arc::new(FailingNotifier);
        let app = router().with_state(app_state_with_notifier(repo, notifier));

        // Act
        let (status, report) = send(app, "POST", "/forfeit-scan", None).await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert!(report["warned"].as_array().unwrap().is_empty());
        assert!(report["forfeited"].as_array().unwrap().is_empty());
        assert_eq!(report["failed_notifications"], 0);
    }

    #[tokio::test]
    async fn test_forfeit_scan_returns_500_when_repository_fails() {
        let app = app(Arc::new(FailingEventRepository));

        let (status, json) = send(app, "POST", "/forfeit-scan", None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "infrastructure_error");
    }
}
