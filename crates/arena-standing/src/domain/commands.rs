//! Commands for the Player Standing context.

use arena_core::command::Command;
use uuid::Uuid;

/// Command to register a new player.
#[derive(Debug, Clone)]
pub struct RegisterPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name.
    pub username: String,
}

impl Command for RegisterPlayer {
    fn command_type(&self) -> &'static str {
        "standing.register_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to restore an Eliminated or Forfeit player to Active.
#[derive(Debug, Clone)]
pub struct ReinstatePlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player identifier.
    pub player_id: Uuid,
}

impl Command for ReinstatePlayer {
    fn command_type(&self) -> &'static str {
        "standing.reinstate_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to forfeit a player whose countdown has run out.
#[derive(Debug, Clone)]
pub struct ForfeitPlayer {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The player identifier.
    pub player_id: Uuid,
}

impl Command for ForfeitPlayer {
    fn command_type(&self) -> &'static str {
        "standing.forfeit_player"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
