//! Domain events for the Game Session context.

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::event::{DomainEvent, EventMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::outcome::{OutcomeValue, SessionOutcome};

/// Emitted when a location starts a session.
///
/// The template's name and mode are copied so later template edits leave
/// the session untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    /// The session identifier.
    pub session_id: Uuid,
    /// The hosting location.
    pub location_id: Uuid,
    /// The template the session was built from.
    pub template_id: Uuid,
    /// Template name at start time.
    pub template_name: String,
    /// Template mode at start time.
    pub mode: ParticipationMode,
    /// When the session started.
    pub started_at: DateTime<Utc>,
}

/// Emitted when a player joins the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantAdded {
    /// The session identifier.
    pub session_id: Uuid,
    /// The new participant's identifier.
    pub participant_id: Uuid,
    /// The joining player.
    pub player_id: Uuid,
    /// The player's username at join time.
    pub username: String,
    /// When the player joined.
    pub joined_at: DateTime<Utc>,
}

/// Emitted when a participant leaves the roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRemoved {
    /// The session identifier.
    pub session_id: Uuid,
    /// The removed participant.
    pub participant_id: Uuid,
    /// The removed participant's player.
    pub player_id: Uuid,
}

/// Emitted when a Solo or Group draft outcome is staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOutcomeSet {
    /// The session identifier.
    pub session_id: Uuid,
    /// The staged value.
    pub value: OutcomeValue,
}

/// Emitted when a Versus participant's draft outcome is staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantOutcomeSet {
    /// The session identifier.
    pub session_id: Uuid,
    /// The player the value applies to.
    pub player_id: Uuid,
    /// The staged value.
    pub value: OutcomeValue,
}

/// Emitted when the staged draft is discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftOutcomeCleared {
    /// The session identifier.
    pub session_id: Uuid,
}

/// A participant's persisted outcome, written on confirm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantResult {
    /// The participant.
    pub participant_id: Uuid,
    /// The participant's player.
    pub player_id: Uuid,
    /// The participant's outcome.
    pub outcome: OutcomeValue,
}

/// Emitted when a session is confirmed.
///
/// Carries the finalized outcome and every participant's result so both
/// become visible in a single event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCompleted {
    /// The session identifier.
    pub session_id: Uuid,
    /// When the session was confirmed.
    pub ended_at: DateTime<Utc>,
    /// The finalized outcome payload.
    pub outcome: SessionOutcome,
    /// Per-participant results.
    pub participant_results: Vec<ParticipantResult>,
}

/// Emitted when a session is cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCancelled {
    /// The session identifier.
    pub session_id: Uuid,
    /// When the session was cancelled.
    pub ended_at: DateTime<Utc>,
}

/// Emitted when an external media reference is attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAttached {
    /// The session identifier.
    pub session_id: Uuid,
    /// Opaque reference to externally stored media.
    pub external_media_ref: String,
}

/// Event type identifier for [`SessionStarted`].
pub const SESSION_STARTED_EVENT_TYPE: &str = "session.started";

/// Event type identifier for [`ParticipantAdded`].
pub const PARTICIPANT_ADDED_EVENT_TYPE: &str = "session.participant_added";

/// Event type identifier for [`ParticipantRemoved`].
pub const PARTICIPANT_REMOVED_EVENT_TYPE: &str = "session.participant_removed";

/// Event type identifier for [`DraftOutcomeSet`].
pub const DRAFT_OUTCOME_SET_EVENT_TYPE: &str = "session.draft_outcome_set";

/// Event type identifier for [`ParticipantOutcomeSet`].
pub const PARTICIPANT_OUTCOME_SET_EVENT_TYPE: &str = "session.participant_outcome_set";

/// Event type identifier for [`DraftOutcomeCleared`].
pub const DRAFT_OUTCOME_CLEARED_EVENT_TYPE: &str = "session.draft_outcome_cleared";

/// Event type identifier for [`SessionCompleted`].
pub const SESSION_COMPLETED_EVENT_TYPE: &str = "session.completed";

/// Event type identifier for [`SessionCancelled`].
pub const SESSION_CANCELLED_EVENT_TYPE: &str = "session.cancelled";

/// Event type identifier for [`MediaAttached`].
pub const MEDIA_ATTACHED_EVENT_TYPE: &str = "session.media_attached";

/// Event payload variants for the Game Session context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEventKind {
    /// A session has started.
    SessionStarted(SessionStarted),
    /// A participant joined.
    ParticipantAdded(ParticipantAdded),
    /// A participant left.
    ParticipantRemoved(ParticipantRemoved),
    /// A uniform draft outcome was staged.
    DraftOutcomeSet(DraftOutcomeSet),
    /// A per-participant draft outcome was staged.
    ParticipantOutcomeSet(ParticipantOutcomeSet),
    /// The draft was discarded.
    DraftOutcomeCleared(DraftOutcomeCleared),
    /// The session was confirmed.
    SessionCompleted(SessionCompleted),
    /// The session was cancelled.
    SessionCancelled(SessionCancelled),
    /// Media was attached.
    MediaAttached(MediaAttached),
}

/// Domain event envelope for the Game Session context.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: SessionEventKind,
}

impl DomainEvent for SessionEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            SessionEventKind::SessionStarted(_) => SESSION_STARTED_EVENT_TYPE,
            SessionEventKind::ParticipantAdded(_) => PARTICIPANT_ADDED_EVENT_TYPE,
            SessionEventKind::ParticipantRemoved(_) => PARTICIPANT_REMOVED_EVENT_TYPE,
            SessionEventKind::DraftOutcomeSet(_) => DRAFT_OUTCOME_SET_EVENT_TYPE,
            SessionEventKind::ParticipantOutcomeSet(_) => PARTICIPANT_OUTCOME_SET_EVENT_TYPE,
            SessionEventKind::DraftOutcomeCleared(_) => DRAFT_OUTCOME_CLEARED_EVENT_TYPE,
            SessionEventKind::SessionCompleted(_) => SESSION_COMPLETED_EVENT_TYPE,
            SessionEventKind::SessionCancelled(_) => SESSION_CANCELLED_EVENT_TYPE,
            SessionEventKind::MediaAttached(_) => MEDIA_ATTACHED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("SessionEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
