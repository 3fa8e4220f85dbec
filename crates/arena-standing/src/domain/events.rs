//! Domain events for the Player Standing context.

use arena_core::event::{DomainEvent, EventMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a player is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerRegistered {
    /// The player identifier.
    pub player_id: Uuid,
    /// Display name.
    pub username: String,
}

/// Emitted for every participant of a confirmed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSessionRecorded {
    /// The player identifier.
    pub player_id: Uuid,
    /// The confirmed session.
    pub session_id: Uuid,
    /// The session's end time; becomes the player's `last_session_at`.
    pub completed_at: DateTime<Utc>,
}

/// Emitted when a confirmed session eliminated the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEliminated {
    /// The player identifier.
    pub player_id: Uuid,
    /// The session that eliminated the player.
    pub session_id: Uuid,
}

/// Emitted when an administrator restores a player to Active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerReinstated {
    /// The player identifier.
    pub player_id: Uuid,
}

/// Emitted when a player loses Active standing through inactivity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerForfeited {
    /// The player identifier.
    pub player_id: Uuid,
    /// Whole hours since the last completed session at forfeit time.
    pub hours_since_last_session: i64,
}

/// Event type identifier for [`PlayerRegistered`].
pub const PLAYER_REGISTERED_EVENT_TYPE: &str = "standing.player_registered";

/// Event type identifier for [`PlayerSessionRecorded`].
pub const PLAYER_SESSION_RECORDED_EVENT_TYPE: &str = "standing.player_session_recorded";

/// Event type identifier for [`PlayerEliminated`].
pub const PLAYER_ELIMINATED_EVENT_TYPE: &str = "standing.player_eliminated";

/// Event type identifier for [`PlayerReinstated`].
pub const PLAYER_REINSTATED_EVENT_TYPE: &str = "standing.player_reinstated";

/// Event type identifier for [`PlayerForfeited`].
pub const PLAYER_FORFEITED_EVENT_TYPE: &str = "standing.player_forfeited";

/// Event payload variants for the Player Standing context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StandingEventKind {
    /// A player has been registered.
    PlayerRegistered(PlayerRegistered),
    /// A player took part in a confirmed session.
    PlayerSessionRecorded(PlayerSessionRecorded),
    /// A player was eliminated.
    PlayerEliminated(PlayerEliminated),
    /// A player was reinstated.
    PlayerReinstated(PlayerReinstated),
    /// A player forfeited.
    PlayerForfeited(PlayerForfeited),
}

/// Domain event envelope for the Player Standing context.
#[derive(Debug, Clone)]
pub struct StandingEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: StandingEventKind,
}

impl DomainEvent for StandingEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            StandingEventKind::PlayerRegistered(_) => PLAYER_REGISTERED_EVENT_TYPE,
            StandingEventKind::PlayerSessionRecorded(_) => PLAYER_SESSION_RECORDED_EVENT_TYPE,
            StandingEventKind::PlayerEliminated(_) => PLAYER_ELIMINATED_EVENT_TYPE,
            StandingEventKind::PlayerReinstated(_) => PLAYER_REINSTATED_EVENT_TYPE,
            StandingEventKind::PlayerForfeited(_) => PLAYER_FORFEITED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("StandingEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
