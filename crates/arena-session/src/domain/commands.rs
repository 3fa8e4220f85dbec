//! Commands for the Game Session context.

use arena_core::command::Command;
use uuid::Uuid;

use super::outcome::OutcomeValue;

/// Command to start a session at a location.
#[derive(Debug, Clone)]
pub struct StartSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The hosting location.
    pub location_id: Uuid,
}

impl Command for StartSession {
    fn command_type(&self) -> &'static str {
        "session.start_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to add a player to a session's roster.
#[derive(Debug, Clone)]
pub struct AddParticipant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The joining player.
    pub player_id: Uuid,
}

impl Command for AddParticipant {
    fn command_type(&self) -> &'static str {
        "session.add_participant"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to remove a participant from a session's roster.
#[derive(Debug, Clone)]
pub struct RemoveParticipant {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The participant to remove.
    pub participant_id: Uuid,
}

impl Command for RemoveParticipant {
    fn command_type(&self) -> &'static str {
        "session.remove_participant"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to stage the roster-wide outcome of a Solo or Group session.
#[derive(Debug, Clone)]
pub struct SetDraftOutcome {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The staged value.
    pub value: OutcomeValue,
}

impl Command for SetDraftOutcome {
    fn command_type(&self) -> &'static str {
        "session.set_draft_outcome"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to stage one participant's outcome in a Versus session.
#[derive(Debug, Clone)]
pub struct SetParticipantOutcome {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// The player the value applies to.
    pub player_id: Uuid,
    /// The staged value.
    pub value: OutcomeValue,
}

impl Command for SetParticipantOutcome {
    fn command_type(&self) -> &'static str {
        "session.set_participant_outcome"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to discard a session's staged draft.
#[derive(Debug, Clone)]
pub struct ClearDraftOutcome {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for ClearDraftOutcome {
    fn command_type(&self) -> &'static str {
        "session.clear_draft_outcome"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to confirm a session's staged outcome.
#[derive(Debug, Clone)]
pub struct ConfirmSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for ConfirmSession {
    fn command_type(&self) -> &'static str {
        "session.confirm_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to cancel a session.
#[derive(Debug, Clone)]
pub struct CancelSession {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
}

impl Command for CancelSession {
    fn command_type(&self) -> &'static str {
        "session.cancel_session"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to attach an external media reference to a session.
#[derive(Debug, Clone)]
pub struct AttachMedia {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The session identifier.
    pub session_id: Uuid,
    /// Opaque reference to externally stored media.
    pub external_media_ref: String,
}

impl Command for AttachMedia {
    fn command_type(&self) -> &'static str {
        "session.attach_media"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
