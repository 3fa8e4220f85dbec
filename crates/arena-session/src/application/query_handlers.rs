//! Query handlers for the Game Session context.
//!
//! This module contains query handlers that reconstitute aggregates
//! from stored events and return read-only view DTOs.

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::aggregate::AggregateRoot;
use arena_core::error::DomainError;
use arena_core::repository::EventRepository;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::application::command_handlers::{load_session, reconstitute};
use crate::domain::aggregates::{Participant, Session};
use crate::domain::events::SESSION_STARTED_EVENT_TYPE;
use crate::domain::outcome::{DraftOutcome, OutcomeValue, SessionOutcome, SessionStatus};

/// Read-only view of a roster entry.
#[derive(Debug, Serialize)]
pub struct ParticipantView {
    /// Participant identifier.
    pub participant_id: Uuid,
    /// The player.
    pub player_id: Uuid,
    /// The player's username at join time.
    pub username: String,
    /// Persisted outcome, set once the session is Completed.
    pub outcome: Option<OutcomeValue>,
    /// When the player joined.
    pub joined_at: DateTime<Utc>,
}

impl From<&Participant> for ParticipantView {
    fn from(participant: &Participant) -> Self {
        Self {
            participant_id: participant.participant_id,
            player_id: participant.player_id,
            username: participant.username.clone(),
            outcome: participant.outcome,
            joined_at: participant.joined_at,
        }
    }
}

/// Read-only view of a session aggregate.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// The session identifier.
    pub session_id: Uuid,
    /// The hosting location.
    pub location_id: Uuid,
    /// The template the session was built from.
    pub template_id: Uuid,
    /// Template name snapshot.
    pub template_name: String,
    /// Participation mode snapshot.
    pub mode: ParticipationMode,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// When the session started.
    pub started_at: Option<DateTime<Utc>>,
    /// When the session was confirmed or cancelled.
    pub ended_at: Option<DateTime<Utc>>,
    /// Current roster.
    pub participants: Vec<ParticipantView>,
    /// Staged outcome.
    pub draft: DraftOutcome,
    /// Whether a confirm would currently succeed.
    pub can_confirm: bool,
    /// Finalized outcome.
    pub outcome: Option<SessionOutcome>,
    /// Reference to externally stored media.
    pub external_media_ref: Option<String>,
    /// Current version (event count).
    pub version: i64,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id,
            location_id: session.location_id(),
            template_id: session.template_id(),
            template_name: session.template_name().to_owned(),
            mode: session.mode(),
            status: session.status(),
            started_at: session.started_at(),
            ended_at: session.ended_at(),
            participants: session
                .participants()
                .iter()
                .map(ParticipantView::from)
                .collect(),
            draft: session.draft().clone(),
            can_confirm: session.can_confirm(),
            outcome: session.outcome().cloned(),
            external_media_ref: session.external_media_ref().map(str::to_owned),
            version: session.version(),
        }
    }
}

/// Criteria for [`list_sessions`]. Unset fields match everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SessionFilter {
    /// Only sessions in this status.
    pub status: Option<SessionStatus>,
    /// Only sessions at this location.
    pub location_id: Option<Uuid>,
    /// Only sessions built from this template.
    pub template_id: Option<Uuid>,
}

impl SessionFilter {
    fn matches(&self, session: &Session) -> bool {
        self.status.is_none_or(|status| session.status() == status)
            && self.location_id.is_none_or(|id| session.location_id() == id)
            && self.template_id.is_none_or(|id| session.template_id() == id)
    }
}

/// Retrieves a session by its aggregate ID.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no session has the ID.
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub async fn get_session_by_id(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<SessionView, DomainError> {
    let session = load_session(session_id, repo).await?;
    Ok(SessionView::from(&session))
}

/// Lists sessions matching the filter, oldest first.
///
/// # Errors
///
/// Returns the repository's error if listing or loading fails.
pub async fn list_sessions(
    filter: SessionFilter,
    repo: &dyn EventRepository,
) -> Result<Vec<SessionView>, DomainError> {
    let ids = repo.list_aggregate_ids(SESSION_STARTED_EVENT_TYPE).await?;
    let mut views = Vec::new();
    for session_id in ids {
        let stored_events = repo.load_events(session_id).await?;
        let session = reconstitute(session_id, &stored_events)?;
        if filter.matches(&session) {
            views.push(SessionView::from(&session));
        }
    }
    Ok(views)
}
