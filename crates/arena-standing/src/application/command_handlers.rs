//! Command handlers for the Player Standing context.
//!
//! This module contains application-level command handler functions that
//! orchestrate domain logic: load aggregate, execute command, persist events.

use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::{EventMetadata, decode_payload};
use arena_core::repository::{EventRepository, StoredEvent};
use tracing::info;
use uuid::Uuid;

use crate::domain::aggregates::Player;
use crate::domain::commands::{ForfeitPlayer, RegisterPlayer, ReinstatePlayer};
use crate::domain::events::{StandingEvent, StandingEventKind};

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct StandingCommandResult {
    /// The aggregate ID affected or created by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `Player` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    player_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Player, DomainError> {
    let mut player = Player::new(player_id);
    for stored in existing_events {
        let kind: StandingEventKind = decode_payload(stored)?;
        let event = StandingEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        player.apply(&event);
    }
    Ok(player)
}

/// Loads a registered player from the store.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no player has the ID, or the
/// repository's error if loading fails.
pub async fn load_player(player_id: Uuid, repo: &dyn EventRepository) -> Result<Player, DomainError> {
    let existing_events = repo.load_events(player_id).await?;
    let player = reconstitute(player_id, &existing_events)?;
    if !player.is_registered() {
        return Err(DomainError::AggregateNotFound(player_id));
    }
    Ok(player)
}

/// Handles the `RegisterPlayer` command.
///
/// This is a CREATION command; the handler generates the `player_id`.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank username, or the
/// repository's error if appending fails.
pub async fn handle_register_player(
    command: &RegisterPlayer,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StandingCommandResult, DomainError> {
    let player_id = Uuid::new_v4();
    let mut player = Player::new(player_id);
    player.register(&command.username, command.correlation_id, clock)?;

    let stored_events = player.stored_uncommitted_events();
    repo.append_events(player_id, player.version(), &stored_events)
        .await?;

    info!(%player_id, "player registered");

    Ok(StandingCommandResult {
        aggregate_id: player_id,
        stored_events,
    })
}

/// Handles the `ReinstatePlayer` command: an administrative override that
/// restores Active standing.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown player, or the
/// repository's error if loading or appending fails.
pub async fn handle_reinstate_player(
    command: &ReinstatePlayer,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StandingCommandResult, DomainError> {
    let mut player = load_player(command.player_id, repo).await?;
    let previous = player.status();
    player.reinstate(command.correlation_id, clock)?;

    let stored_events = player.stored_uncommitted_events();
    repo.append_events(command.player_id, player.version(), &stored_events)
        .await?;

    if !stored_events.is_empty() {
        info!(player_id = %command.player_id, %previous, "player reinstated");
    }

    Ok(StandingCommandResult {
        aggregate_id: command.player_id,
        stored_events,
    })
}

/// Handles the `ForfeitPlayer` command.
///
/// Eligibility is re-evaluated against the freshly loaded stream, and the
/// append is conditional on that version, so a session confirmed in the
/// meantime makes the forfeit fail rather than overwrite new activity.
///
/// # Errors
///
/// Returns `DomainError::Precondition` if the player is not eligible,
/// `DomainError::AggregateNotFound` for an unknown player, or the
/// repository's error if loading or appending fails.
pub async fn handle_forfeit_player(
    command: &ForfeitPlayer,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<StandingCommandResult, DomainError> {
    let mut player = load_player(command.player_id, repo).await?;
    player.forfeit(command.correlation_id, clock)?;

    let stored_events = player.stored_uncommitted_events();
    repo.append_events(command.player_id, player.version(), &stored_events)
        .await?;

    info!(player_id = %command.player_id, "player forfeited");

    Ok(StandingCommandResult {
        aggregate_id: command.player_id,
        stored_events,
    })
}
