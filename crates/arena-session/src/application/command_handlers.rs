//! Command handlers for the Game Session context.
//!
//! Starting, confirming and cancelling a session touch more than one
//! stream; those handlers write every affected stream in one atomic batch,
//! each conditional on the version it was read at.

use arena_catalog::application::command_handlers::load_template;
use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::{EventMetadata, decode_payload};
use arena_core::repository::{EventRepository, StoredEvent, StreamAppend};
use arena_standing::application::command_handlers::load_player;
use arena_venue::application::command_handlers::load_location;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::aggregates::Session;
use crate::domain::commands::{
    AddParticipant, AttachMedia, CancelSession, ClearDraftOutcome, ConfirmSession,
    RemoveParticipant, SetDraftOutcome, SetParticipantOutcome, StartSession,
};
use crate::domain::events::{SessionEvent, SessionEventKind};
use crate::domain::outcome::OutcomeValue;

/// How many times a confirm or cancel is attempted when a concurrent write
/// to one of its streams wins the race.
const MAX_CLOSE_ATTEMPTS: u32 = 3;

/// Result of a successfully handled command.
#[derive(Debug)]
pub struct SessionCommandResult {
    /// The session affected or created by the command.
    pub aggregate_id: Uuid,
    /// The stored events produced and persisted, across every stream.
    pub stored_events: Vec<StoredEvent>,
}

/// Reconstitutes a `Session` from stored events.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if event deserialization fails.
pub fn reconstitute(
    session_id: Uuid,
    existing_events: &[StoredEvent],
) -> Result<Session, DomainError> {
    let mut session = Session::new(session_id);
    for stored in existing_events {
        let kind: SessionEventKind = decode_payload(stored)?;
        let event = SessionEvent {
            metadata: EventMetadata::from_stored(stored),
            kind,
        };
        session.apply(&event);
    }
    Ok(session)
}

/// Loads a started session from the store.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` if no session has the ID, or the
/// repository's error if loading fails.
pub async fn load_session(
    session_id: Uuid,
    repo: &dyn EventRepository,
) -> Result<Session, DomainError> {
    let existing_events = repo.load_events(session_id).await?;
    let session = reconstitute(session_id, &existing_events)?;
    if !session.is_started() {
        return Err(DomainError::AggregateNotFound(session_id));
    }
    Ok(session)
}

async fn persist(
    session: &Session,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let stored_events = session.stored_uncommitted_events();
    repo.append_events(session.id, session.version(), &stored_events)
        .await?;
    Ok(SessionCommandResult {
        aggregate_id: session.id,
        stored_events,
    })
}

/// Writes a batch and flattens its events into a command result.
async fn persist_batch(
    session_id: Uuid,
    batch: Vec<StreamAppend>,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    repo.append_batch(&batch).await?;
    Ok(SessionCommandResult {
        aggregate_id: session_id,
        stored_events: batch.into_iter().flat_map(|append| append.events).collect(),
    })
}

/// Handles the `StartSession` command.
///
/// The location must be active with a template assigned. The session copies
/// the template's current name and mode, and the location records the new
/// session as open in the same write.
///
/// # Errors
///
/// Returns `DomainError::Precondition` if the location is inactive, has no
/// template, or its template has since been retired;
/// `DomainError::AggregateNotFound` for an unknown location; or the
/// repository's error (a `ConcurrencyConflict` if the location changed
/// concurrently).
pub async fn handle_start_session(
    command: &StartSession,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut location = load_location(command.location_id, repo).await?;
    let session_id = Uuid::new_v4();
    let template_id = location.open_session(session_id, command.correlation_id, clock)?;

    let template = match load_template(template_id, repo).await {
        Ok(template) => template,
        Err(DomainError::AggregateNotFound(_)) => {
            return Err(DomainError::Precondition(format!(
                "template {template_id} assigned to location {} is no longer available",
                command.location_id
            )));
        }
        Err(e) => return Err(e),
    };
    let mode = template
        .mode()
        .ok_or(DomainError::AggregateNotFound(template_id))?;

    let mut session = Session::new(session_id);
    session.start(
        command.location_id,
        template_id,
        template.name(),
        mode,
        command.correlation_id,
        clock,
    )?;

    let result = persist_batch(
        session_id,
        vec![
            StreamAppend::new(session_id, 0, session.stored_uncommitted_events()),
            StreamAppend::new(
                location.id,
                location.version(),
                location.stored_uncommitted_events(),
            ),
        ],
        repo,
    )
    .await?;

    info!(
        %session_id,
        location_id = %command.location_id,
        %template_id,
        %mode,
        "session started"
    );
    Ok(result)
}

/// Handles the `AddParticipant` command. The player's current username is
/// copied onto the roster entry.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown session or
/// player, `DomainError::Precondition` unless the session is Active,
/// `DomainError::Conflict` for a duplicate player or a full Solo roster, or
/// the repository's error if loading or appending fails.
pub async fn handle_add_participant(
    command: &AddParticipant,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    let player = load_player(command.player_id, repo).await?;
    session.add_participant(
        Uuid::new_v4(),
        command.player_id,
        player.username(),
        command.correlation_id,
        clock,
    )?;
    persist(&session, repo).await
}

/// Handles the `RemoveParticipant` command.
///
/// # Errors
///
/// Returns `DomainError::AggregateNotFound` for an unknown session or
/// participant, `DomainError::Precondition` unless the session is Active, or
/// the repository's error if loading or appending fails.
pub async fn handle_remove_participant(
    command: &RemoveParticipant,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    session.remove_participant(command.participant_id, command.correlation_id, clock)?;
    persist(&session, repo).await
}

/// Handles the `SetDraftOutcome` command.
///
/// # Errors
///
/// Returns `DomainError::Precondition` unless the session is an Active Solo
/// or Group session with a non-empty roster,
/// `DomainError::AggregateNotFound` for an unknown session, or the
/// repository's error if loading or appending fails.
pub async fn handle_set_draft_outcome(
    command: &SetDraftOutcome,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    session.set_draft_outcome(command.value, command.correlation_id, clock)?;
    persist(&session, repo).await
}

/// Handles the `SetParticipantOutcome` command.
///
/// # Errors
///
/// Returns `DomainError::Precondition` unless the session is an Active
/// Versus session with a non-empty roster, `DomainError::AggregateNotFound`
/// for an unknown session or a player not on the roster, or the repository's
/// error if loading or appending fails.
pub async fn handle_set_participant_outcome(
    command: &SetParticipantOutcome,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    session.set_participant_outcome(
        command.player_id,
        command.value,
        command.correlation_id,
        clock,
    )?;
    persist(&session, repo).await
}

/// Handles the `ClearDraftOutcome` command.
///
/// # Errors
///
/// Returns `DomainError::Precondition` unless the session is Active,
/// `DomainError::AggregateNotFound` for an unknown session, or the
/// repository's error if loading or appending fails.
pub async fn handle_clear_draft_outcome(
    command: &ClearDraftOutcome,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    session.clear_draft_outcome(command.correlation_id, clock)?;
    persist(&session, repo).await
}

/// Handles the `AttachMedia` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` for a blank reference,
/// `DomainError::AggregateNotFound` for an unknown session, or the
/// repository's error if loading or appending fails.
pub async fn handle_attach_media(
    command: &AttachMedia,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    session.attach_media(&command.external_media_ref, command.correlation_id, clock)?;
    persist(&session, repo).await
}

/// Runs a session-closing attempt until it lands, fails for a reason other
/// than a lost race, or runs out of attempts.
///
/// Every attempt starts from a fresh read, so a session closed by the
/// winning caller surfaces as the aggregate's own "already completed" or
/// "already cancelled" conflict.
async fn with_close_retries<F, Fut>(
    session_id: Uuid,
    action: &str,
    mut attempt: F,
) -> Result<SessionCommandResult, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SessionCommandResult, DomainError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt().await {
            Err(e @ DomainError::ConcurrencyConflict { .. }) if attempts < MAX_CLOSE_ATTEMPTS => {
                warn!(%session_id, attempts, error = %e, "{action} lost a write race, retrying");
            }
            other => return other,
        }
    }
}

async fn try_confirm(
    command: &ConfirmSession,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let ended_at = clock.now();
    let mut session = load_session(command.session_id, repo).await?;
    let results = session.confirm(command.correlation_id, ended_at)?;

    let mut location = load_location(session.location_id(), repo).await?;
    location.close_session(session.id, command.correlation_id, clock)?;

    let mut batch = vec![
        StreamAppend::new(
            session.id,
            session.version(),
            session.stored_uncommitted_events(),
        ),
        StreamAppend::new(
            location.id,
            location.version(),
            location.stored_uncommitted_events(),
        ),
    ];
    for result in &results {
        let mut player = load_player(result.player_id, repo).await?;
        player.record_session(
            session.id,
            result.outcome == OutcomeValue::Eliminated,
            command.correlation_id,
            ended_at,
        )?;
        batch.push(StreamAppend::new(
            player.id,
            player.version(),
            player.stored_uncommitted_events(),
        ));
    }

    persist_batch(session.id, batch, repo).await
}

/// Handles the `ConfirmSession` command.
///
/// In one atomic write: the session becomes Completed with its outcome and
/// per-participant results, the location closes the session, and every
/// participant's player records the session (eliminated participants also
/// lose Active standing).
///
/// # Errors
///
/// Returns `DomainError::Conflict` if the session is already Completed or
/// Cancelled (including when a concurrent confirm won),
/// `DomainError::Precondition` if the roster is empty or the draft does not
/// cover it, `DomainError::AggregateNotFound` for an unknown session, or
/// the repository's error if the write keeps losing races.
pub async fn handle_confirm_session(
    command: &ConfirmSession,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let result = with_close_retries(command.session_id, "confirm", || {
        try_confirm(command, clock, repo)
    })
    .await?;
    info!(session_id = %command.session_id, "session confirmed");
    Ok(result)
}

async fn try_cancel(
    command: &CancelSession,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let mut session = load_session(command.session_id, repo).await?;
    session.cancel(command.correlation_id, clock)?;

    let mut location = load_location(session.location_id(), repo).await?;
    location.close_session(session.id, command.correlation_id, clock)?;

    persist_batch(
        session.id,
        vec![
            StreamAppend::new(
                session.id,
                session.version(),
                session.stored_uncommitted_events(),
            ),
            StreamAppend::new(
                location.id,
                location.version(),
                location.stored_uncommitted_events(),
            ),
        ],
        repo,
    )
    .await
}

/// Handles the `CancelSession` command: the session becomes Cancelled and
/// the location closes it, atomically. No outcome and no player changes.
///
/// # Errors
///
/// Returns `DomainError::Conflict` if the session is already Completed or
/// Cancelled, `DomainError::AggregateNotFound` for an unknown session, or
/// the repository's error if the write keeps losing races.
pub async fn handle_cancel_session(
    command: &CancelSession,
    clock: &dyn Clock,
    repo: &dyn EventRepository,
) -> Result<SessionCommandResult, DomainError> {
    let result = with_close_retries(command.session_id, "cancel", || {
        try_cancel(command, clock, repo)
    })
    .await?;
    info!(session_id = %command.session_id, "session cancelled");
    Ok(result)
}
