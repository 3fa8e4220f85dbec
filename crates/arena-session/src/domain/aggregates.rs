//! Aggregate roots for the Game Session context.

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::EventMetadata;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::events::{
    DRAFT_OUTCOME_CLEARED_EVENT_TYPE, DRAFT_OUTCOME_SET_EVENT_TYPE, DraftOutcomeCleared,
    DraftOutcomeSet, MEDIA_ATTACHED_EVENT_TYPE, MediaAttached, PARTICIPANT_ADDED_EVENT_TYPE,
    PARTICIPANT_OUTCOME_SET_EVENT_TYPE, PARTICIPANT_REMOVED_EVENT_TYPE, ParticipantAdded,
    ParticipantOutcomeSet, ParticipantRemoved, ParticipantResult, SESSION_CANCELLED_EVENT_TYPE,
    SESSION_COMPLETED_EVENT_TYPE, SESSION_STARTED_EVENT_TYPE, SessionCancelled, SessionCompleted,
    SessionEvent, SessionEventKind, SessionStarted,
};
use super::outcome::{DraftOutcome, OutcomeValue, SessionOutcome, SessionStatus};

/// A player on a session's roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Participant identifier, unique within the session.
    pub participant_id: Uuid,
    /// The player taking part.
    pub player_id: Uuid,
    /// The player's username when they joined.
    pub username: String,
    /// Persisted outcome; set only when the session is confirmed.
    pub outcome: Option<OutcomeValue>,
    /// When the player joined.
    pub joined_at: DateTime<Utc>,
}

/// The aggregate root for a game session.
#[derive(Debug)]
pub struct Session {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Whether `SessionStarted` has been applied.
    pub(crate) started: bool,
    /// The hosting location.
    pub(crate) location_id: Uuid,
    /// The template the session was built from.
    pub(crate) template_id: Uuid,
    /// Template name snapshot.
    pub(crate) template_name: String,
    /// Participation mode snapshot.
    pub(crate) mode: ParticipationMode,
    /// Lifecycle status.
    pub(crate) status: SessionStatus,
    /// When the session started.
    pub(crate) started_at: Option<DateTime<Utc>>,
    /// When the session was confirmed or cancelled.
    pub(crate) ended_at: Option<DateTime<Utc>>,
    /// Current roster, in join order.
    pub(crate) participants: Vec<Participant>,
    /// Staged outcome.
    pub(crate) draft: DraftOutcome,
    /// Finalized outcome, present once Completed.
    pub(crate) outcome: Option<SessionOutcome>,
    /// Reference to externally stored media.
    pub(crate) external_media_ref: Option<String>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<SessionEvent>,
}

impl Session {
    /// Creates a new, empty session aggregate.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            started: false,
            location_id: Uuid::nil(),
            template_id: Uuid::nil(),
            template_name: String::new(),
            mode: ParticipationMode::Solo,
            status: SessionStatus::Active,
            started_at: None,
            ended_at: None,
            participants: Vec::new(),
            draft: DraftOutcome::Uniform { value: None },
            outcome: None,
            external_media_ref: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns whether the session has been started.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Returns the hosting location.
    #[must_use]
    pub fn location_id(&self) -> Uuid {
        self.location_id
    }

    /// Returns the template the session was built from.
    #[must_use]
    pub fn template_id(&self) -> Uuid {
        self.template_id
    }

    /// Returns the template name snapshot.
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Returns the participation mode snapshot.
    #[must_use]
    pub fn mode(&self) -> ParticipationMode {
        self.mode
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns when the session started.
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the session ended.
    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Returns the roster in join order.
    #[must_use]
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Returns the staged outcome.
    #[must_use]
    pub fn draft(&self) -> &DraftOutcome {
        &self.draft
    }

    /// Returns the finalized outcome.
    #[must_use]
    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Returns the external media reference.
    #[must_use]
    pub fn external_media_ref(&self) -> Option<&str> {
        self.external_media_ref.as_deref()
    }

    /// Returns `true` if the session is Active, has at least one
    /// participant, and the draft covers the whole current roster.
    #[must_use]
    pub fn can_confirm(&self) -> bool {
        self.started && self.status == SessionStatus::Active && self.missing_outcome().is_none()
    }

    /// Describes why the draft cannot be confirmed, or `None` if it can.
    fn missing_outcome(&self) -> Option<String> {
        if self.participants.is_empty() {
            return Some("roster is empty".to_owned());
        }
        match &self.draft {
            DraftOutcome::Uniform { value: None } => Some("no outcome has been staged".to_owned()),
            DraftOutcome::Uniform { value: Some(_) } => None,
            DraftOutcome::PerParticipant { values } => {
                let missing: Vec<&str> = self
                    .participants
                    .iter()
                    .filter(|p| !values.contains_key(&p.player_id))
                    .map(|p| p.username.as_str())
                    .collect();
                if missing.is_empty() {
                    None
                } else {
                    Some(format!("no outcome staged for {}", missing.join(", ")))
                }
            }
        }
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        event_type: &str,
        kind: SessionEventKind,
        correlation_id: Uuid,
        occurred_at: DateTime<Utc>,
    ) {
        let metadata = EventMetadata::new(
            event_type,
            self.id,
            self.next_sequence_number(),
            correlation_id,
            occurred_at,
        );
        self.uncommitted_events.push(SessionEvent { metadata, kind });
    }

    fn ensure_started(&self) -> Result<(), DomainError> {
        if self.started {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    /// Roster and draft changes require an Active session.
    fn ensure_active(&self, action: &str) -> Result<(), DomainError> {
        self.ensure_started()?;
        if self.status == SessionStatus::Active {
            Ok(())
        } else {
            Err(DomainError::Precondition(format!(
                "cannot {action}: session {} is {}",
                self.id, self.status
            )))
        }
    }

    /// Closing a session that is already closed lost a race or is a retry.
    fn ensure_not_closed(&self) -> Result<(), DomainError> {
        self.ensure_started()?;
        if self.status.is_terminal() {
            return Err(DomainError::Conflict(format!(
                "session {} already {}",
                self.id, self.status
            )));
        }
        Ok(())
    }

    fn ensure_roster_not_empty(&self) -> Result<(), DomainError> {
        if self.participants.is_empty() {
            return Err(DomainError::Precondition(format!(
                "session {} has no participants",
                self.id
            )));
        }
        Ok(())
    }

    /// Starts the session, producing a `SessionStarted` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the session was already started.
    pub fn start(
        &mut self,
        location_id: Uuid,
        template_id: Uuid,
        template_name: &str,
        mode: ParticipationMode,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.started {
            return Err(DomainError::Conflict(format!(
                "session {} already started",
                self.id
            )));
        }

        self.record(
            SESSION_STARTED_EVENT_TYPE,
            SessionEventKind::SessionStarted(SessionStarted {
                session_id: self.id,
                location_id,
                template_id,
                template_name: template_name.to_owned(),
                mode,
                started_at: clock.now(),
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Adds a player to the roster, producing a `ParticipantAdded` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the session is Active, or
    /// `DomainError::Conflict` if the player is already on the roster or the
    /// mode's capacity is reached.
    pub fn add_participant(
        &mut self,
        participant_id: Uuid,
        player_id: Uuid,
        username: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active("add a participant")?;
        if self.participants.iter().any(|p| p.player_id == player_id) {
            return Err(DomainError::Conflict(format!(
                "player {player_id} is already in session {}",
                self.id
            )));
        }
        if let Some(capacity) = self.mode.capacity() {
            if self.participants.len() >= capacity {
                return Err(DomainError::Conflict(format!(
                    "{} session {} is full ({capacity} participant max)",
                    self.mode, self.id
                )));
            }
        }

        self.record(
            PARTICIPANT_ADDED_EVENT_TYPE,
            SessionEventKind::ParticipantAdded(ParticipantAdded {
                session_id: self.id,
                participant_id,
                player_id,
                username: username.to_owned(),
                joined_at: clock.now(),
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Removes a participant, producing a `ParticipantRemoved` event.
    ///
    /// Applying the event drops the staged outcome the removal makes stale:
    /// the whole uniform draft, or the removed player's Versus entry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the session is Active, or
    /// `DomainError::AggregateNotFound` if no participant has the ID.
    pub fn remove_participant(
        &mut self,
        participant_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active("remove a participant")?;
        let player_id = self
            .participants
            .iter()
            .find(|p| p.participant_id == participant_id)
            .map(|p| p.player_id)
            .ok_or(DomainError::AggregateNotFound(participant_id))?;

        self.record(
            PARTICIPANT_REMOVED_EVENT_TYPE,
            SessionEventKind::ParticipantRemoved(ParticipantRemoved {
                session_id: self.id,
                participant_id,
                player_id,
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Stages the roster-wide outcome of a Solo or Group session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the session is Active with
    /// a non-empty roster and a uniform-outcome mode.
    pub fn set_draft_outcome(
        &mut self,
        value: OutcomeValue,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active("stage an outcome")?;
        self.ensure_roster_not_empty()?;
        if !self.mode.has_uniform_outcome() {
            return Err(DomainError::Precondition(format!(
                "{} sessions take per-participant outcomes",
                self.mode
            )));
        }

        self.record(
            DRAFT_OUTCOME_SET_EVENT_TYPE,
            SessionEventKind::DraftOutcomeSet(DraftOutcomeSet {
                session_id: self.id,
                value,
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Stages one player's outcome in a Versus session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the session is Active with
    /// a non-empty roster in Versus mode, or `DomainError::AggregateNotFound`
    /// if the player is not on the roster.
    pub fn set_participant_outcome(
        &mut self,
        player_id: Uuid,
        value: OutcomeValue,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active("stage an outcome")?;
        self.ensure_roster_not_empty()?;
        if self.mode.has_uniform_outcome() {
            return Err(DomainError::Precondition(format!(
                "{} sessions take a single roster-wide outcome",
                self.mode
            )));
        }
        if !self.participants.iter().any(|p| p.player_id == player_id) {
            return Err(DomainError::AggregateNotFound(player_id));
        }

        self.record(
            PARTICIPANT_OUTCOME_SET_EVENT_TYPE,
            SessionEventKind::ParticipantOutcomeSet(ParticipantOutcomeSet {
                session_id: self.id,
                player_id,
                value,
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Discards the staged draft, producing a `DraftOutcomeCleared` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Precondition` unless the session is Active.
    pub fn clear_draft_outcome(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_active("clear the staged outcome")?;

        self.record(
            DRAFT_OUTCOME_CLEARED_EVENT_TYPE,
            SessionEventKind::DraftOutcomeCleared(DraftOutcomeCleared {
                session_id: self.id,
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Confirms the staged outcome, producing a `SessionCompleted` event.
    ///
    /// Returns every participant's result so the caller can update player
    /// standing in the same write, stamped with the same `ended_at`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the session is already Completed or
    /// Cancelled, or `DomainError::Precondition` if the roster is empty or
    /// the draft does not cover every current participant.
    pub fn confirm(
        &mut self,
        correlation_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Vec<ParticipantResult>, DomainError> {
        self.ensure_not_closed()?;
        if let Some(reason) = self.missing_outcome() {
            return Err(DomainError::Precondition(format!(
                "session {} cannot be confirmed: {reason}",
                self.id
            )));
        }

        let (outcome, participant_results) = self.finalize()?;

        self.record(
            SESSION_COMPLETED_EVENT_TYPE,
            SessionEventKind::SessionCompleted(SessionCompleted {
                session_id: self.id,
                ended_at,
                outcome,
                participant_results: participant_results.clone(),
            }),
            correlation_id,
            ended_at,
        );
        Ok(participant_results)
    }

    /// Builds the outcome payload and per-participant results from the draft.
    fn finalize(&self) -> Result<(SessionOutcome, Vec<ParticipantResult>), DomainError> {
        let mut results = Vec::with_capacity(self.participants.len());
        let outcome = match &self.draft {
            DraftOutcome::Uniform { value } => {
                let value = value.ok_or_else(|| {
                    DomainError::Precondition(format!("session {} has no staged outcome", self.id))
                })?;
                for participant in &self.participants {
                    results.push(ParticipantResult {
                        participant_id: participant.participant_id,
                        player_id: participant.player_id,
                        outcome: value,
                    });
                }
                SessionOutcome::Uniform {
                    result: value.into(),
                }
            }
            DraftOutcome::PerParticipant { values } => {
                let mut winners = Vec::new();
                let mut eliminated = Vec::new();
                for participant in &self.participants {
                    let value = values.get(&participant.player_id).copied().ok_or_else(|| {
                        DomainError::Precondition(format!(
                            "no outcome staged for {}",
                            participant.username
                        ))
                    })?;
                    match value {
                        OutcomeValue::Win => winners.push(participant.username.clone()),
                        OutcomeValue::Eliminated => eliminated.push(participant.username.clone()),
                    }
                    results.push(ParticipantResult {
                        participant_id: participant.participant_id,
                        player_id: participant.player_id,
                        outcome: value,
                    });
                }
                SessionOutcome::Versus {
                    winners,
                    eliminated,
                }
            }
        };
        Ok((outcome, results))
    }

    /// Cancels the session, producing a `SessionCancelled` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the session is already Completed or
    /// Cancelled.
    pub fn cancel(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_not_closed()?;

        let ended_at = clock.now();
        self.record(
            SESSION_CANCELLED_EVENT_TYPE,
            SessionEventKind::SessionCancelled(SessionCancelled {
                session_id: self.id,
                ended_at,
            }),
            correlation_id,
            ended_at,
        );
        Ok(())
    }

    /// Attaches an external media reference. Allowed in any status.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the reference is blank.
    pub fn attach_media(
        &mut self,
        external_media_ref: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_started()?;
        let external_media_ref = external_media_ref.trim();
        if external_media_ref.is_empty() {
            return Err(DomainError::Validation(
                "media reference must not be empty".into(),
            ));
        }

        self.record(
            MEDIA_ATTACHED_EVENT_TYPE,
            SessionEventKind::MediaAttached(MediaAttached {
                session_id: self.id,
                external_media_ref: external_media_ref.to_owned(),
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }
}

impl AggregateRoot for Session {
    type Event = SessionEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            SessionEventKind::SessionStarted(payload) => {
                self.started = true;
                self.location_id = payload.location_id;
                self.template_id = payload.template_id;
                self.template_name.clone_from(&payload.template_name);
                self.mode = payload.mode;
                self.status = SessionStatus::Active;
                self.started_at = Some(payload.started_at);
                self.draft = DraftOutcome::empty_for(payload.mode);
            }
            SessionEventKind::ParticipantAdded(payload) => {
                self.participants.push(Participant {
                    participant_id: payload.participant_id,
                    player_id: payload.player_id,
                    username: payload.username.clone(),
                    outcome: None,
                    joined_at: payload.joined_at,
                });
            }
            SessionEventKind::ParticipantRemoved(payload) => {
                self.participants
                    .retain(|p| p.participant_id != payload.participant_id);
                match &mut self.draft {
                    DraftOutcome::Uniform { value } => *value = None,
                    DraftOutcome::PerParticipant { values } => {
                        values.remove(&payload.player_id);
                    }
                }
            }
            SessionEventKind::DraftOutcomeSet(payload) => {
                if let DraftOutcome::Uniform { value } = &mut self.draft {
                    *value = Some(payload.value);
                }
            }
            SessionEventKind::ParticipantOutcomeSet(payload) => {
                if let DraftOutcome::PerParticipant { values } = &mut self.draft {
                    values.insert(payload.player_id, payload.value);
                }
            }
            SessionEventKind::DraftOutcomeCleared(_) => {
                self.draft.clear();
            }
            SessionEventKind::SessionCompleted(payload) => {
                self.status = SessionStatus::Completed;
                self.ended_at = Some(payload.ended_at);
                self.outcome = Some(payload.outcome.clone());
                for result in &payload.participant_results {
                    if let Some(participant) = self
                        .participants
                        .iter_mut()
                        .find(|p| p.participant_id == result.participant_id)
                    {
                        participant.outcome = Some(result.outcome);
                    }
                }
                self.draft.clear();
            }
            SessionEventKind::SessionCancelled(payload) => {
                self.status = SessionStatus::Cancelled;
                self.ended_at = Some(payload.ended_at);
                self.draft.clear();
            }
            SessionEventKind::MediaAttached(payload) => {
                self.external_media_ref = Some(payload.external_media_ref.clone());
            }
        }
        self.version += 1;
    }

    fn uncommitted_events(&self) -> &[Self::Event] {
        &self.uncommitted_events
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted_events.clear();
    }
}
