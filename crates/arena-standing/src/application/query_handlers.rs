//! Query handlers for the Player Standing context.

use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::repository::EventRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_player, reconstitute};
use crate::domain::aggregates::{GlobalStatus, Player};
use crate::domain::events::PLAYER_REGISTERED_EVENT_TYPE;
use crate::domain::forfeit;

/// Read-only view of a player aggregate.
#[derive(Debug, Serialize)]
pub struct PlayerView {
    /// The player identifier.
    pub player_id: Uuid,
    /// Display name.
    pub username: String,
    /// Global standing.
    pub global_status: GlobalStatus,
    /// End time of the player's last confirmed session.
    pub last_session_at: Option<DateTime<Utc>>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            player_id: player.id,
            username: player.username().to_owned(),
            global_status: player.status(),
            last_session_at: player.last_session_at(),
            version: player.version(),
        }
    }
}

/// A player's forfeit countdown evaluated at a given instant.
#[derive(Debug, Serialize)]
pub struct StandingView {
    /// The player identifier.
    pub player_id: Uuid,
    /// Global standing.
    pub global_status: GlobalStatus,
    /// End time of the player's last confirmed session.
    pub last_session_at: Option<DateTime<Utc>>,
    /// Whole hours since that session.
    pub hours_since_last_session: Option<i64>,
    /// Whether the player may be forfeited now.
    pub forfeit_eligible: bool,
    /// Whether the player is inside the warning window.
    pub approaching_forfeit: bool,
    /// The instant the predicates were evaluated at.
    pub evaluated_at: DateTime<Utc>,
}

/// Retrieves a player by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no player has the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_player_by_id(
    player_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<PlayerView, DomainError> {
    let player = load_player(player_id, repo).await?;
    Ok(PlayerView::from(&player))
}

/// Lists every registered player, oldest first.
///
/// # Errors
///
/// Returns the repository's error if listing or loading fails.
pub async fn list_players(repo: &dyn EventRepository) -> Result<Vec<PlayerView>, DomainError> {
    let ids = repo.list_aggregate_ids(PLAYER_REGISTERED_EVENT_TYPE).await?;
    let mut views = Vec::with_capacity(ids.len());
    for player_id in ids {
        let stored_events = repo.load_events(player_id).await?;
        let player = reconstitute(player_id, &stored_events)?;
        views.push(PlayerView::from(&player));
    }
    Ok(views)
}

/// Evaluates a player's forfeit countdown at the clock's current time.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no player has the ID.
pub async fn get_player_standing(
    player_id: Uuid,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StandingView, DomainError> {
    let player = load_player(player_id, repo).await?;
    let now = clock.now();
    Ok(StandingView {
        player_id,
        global_status: player.status(),
        last_session_at: player.last_session_at(),
        hours_since_last_session: forfeit::hours_since_last_session(&player, now),
        forfeit_eligible: forfeit::is_forfeit_eligible(&player, now),
        approaching_forfeit: forfeit::is_approaching_forfeit(&player, now),
        evaluated_at: now,
    })
}
