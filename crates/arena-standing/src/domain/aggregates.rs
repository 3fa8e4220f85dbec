//! Aggregate roots for the Player Standing context.

use std::fmt;

use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::EventMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::events::{
    PLAYER_ELIMINATED_EVENT_TYPE, PLAYER_FORFEITED_EVENT_TYPE, PLAYER_REGISTERED_EVENT_TYPE,
    PLAYER_REINSTATED_EVENT_TYPE, PLAYER_SESSION_RECORDED_EVENT_TYPE, PlayerEliminated,
    PlayerForfeited, PlayerRegistered, PlayerReinstated, PlayerSessionRecorded, StandingEvent,
    StandingEventKind,
};
use super::forfeit;

/// A player's standing across the whole competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlobalStatus {
    /// Still competing.
    Active,
    /// Knocked out by a confirmed session.
    Eliminated,
    /// Lost standing through inactivity.
    Forfeit,
}

impl GlobalStatus {
    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Eliminated => "eliminated",
            Self::Forfeit => "forfeit",
        }
    }
}

impl fmt::Display for GlobalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aggregate root for a player.
#[derive(Debug)]
pub struct Player {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Whether `PlayerRegistered` has been applied.
    pub(crate) registered: bool,
    /// Display name.
    pub(crate) username: String,
    /// Global standing.
    pub(crate) status: GlobalStatus,
    /// End time of the most recent confirmed session the player took part in.
    pub(crate) last_session_at: Option<DateTime<Utc>>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<StandingEvent>,
}

impl Player {
    /// Creates a new, empty player aggregate.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            registered: false,
            username: String::new(),
            status: GlobalStatus::Active,
            last_session_at: None,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns whether the player has been registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Returns the display name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the global standing.
    #[must_use]
    pub fn status(&self) -> GlobalStatus {
        self.status
    }

    /// Returns when the player last completed a session, if ever.
    #[must_use]
    pub fn last_session_at(&self) -> Option<DateTime<Utc>> {
        self.last_session_at
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        event_type: &str,
        kind: StandingEventKind,
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
        self.uncommitted_events.push(StandingEvent { metadata, kind });
    }

    fn ensure_registered(&self) -> Result<(), DomainError> {
        if self.registered {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    /// Registers the player, producing a `PlayerRegistered` event. New
    /// players are Active and have never completed a session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the username is blank, or
    /// `DomainError::Conflict` if the player is already registered.
    pub fn register(
        &mut self,
        username: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.registered {
            return Err(DomainError::Conflict(format!(
                "player {} already registered",
                self.id
            )));
        }
        let username = username.trim();
        if username.is_empty() {
            return Err(DomainError::Validation("username must not be empty".into()));
        }

        self.record(
            PLAYER_REGISTERED_EVENT_TYPE,
            StandingEventKind::PlayerRegistered(PlayerRegistered {
                player_id: self.id,
                username: username.to_owned(),
            }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Records the player's part in a confirmed session.
    ///
    /// Always produces `PlayerSessionRecorded`, which resets the forfeit
    /// countdown; an eliminated participant also gets `PlayerEliminated`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the player is unknown.
    pub fn record_session(
        &mut self,
        session_id: Uuid,
        eliminated: bool,
        correlation_id: Uuid,
        completed_at: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_registered()?;

        self.record(
            PLAYER_SESSION_RECORDED_EVENT_TYPE,
            StandingEventKind::PlayerSessionRecorded(PlayerSessionRecorded {
                player_id: self.id,
                session_id,
                completed_at,
            }),
            correlation_id,
            completed_at,
        );
        if eliminated {
            self.record(
                PLAYER_ELIMINATED_EVENT_TYPE,
                StandingEventKind::PlayerEliminated(PlayerEliminated {
                    player_id: self.id,
                    session_id,
                }),
                correlation_id,
                completed_at,
            );
        }
        Ok(())
    }

    /// Restores the player to Active regardless of when they last played.
    ///
    /// An already Active player is left untouched and no event is produced.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the player is unknown.
    pub fn reinstate(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_registered()?;
        if self.status == GlobalStatus::Active {
            return Ok(());
        }

        self.record(
            PLAYER_REINSTATED_EVENT_TYPE,
            StandingEventKind::PlayerReinstated(PlayerReinstated { player_id: self.id }),
            correlation_id,
            clock.now(),
        );
        Ok(())
    }

    /// Forfeits the player, producing a `PlayerForfeited` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the player is unknown, or
    /// `DomainError::Precondition` if the player is not forfeit-eligible at
    /// the clock's current time.
    pub fn forfeit(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_registered()?;
        let now = clock.now();
        if !forfeit::is_forfeit_eligible(self, now) {
            return Err(DomainError::Precondition(format!(
                "player {} is not eligible for forfeit",
                self.id
            )));
        }
        let hours_since_last_session = forfeit::hours_since_last_session(self, now).unwrap_or(0);

        self.record(
            PLAYER_FORFEITED_EVENT_TYPE,
            StandingEventKind::PlayerForfeited(PlayerForfeited {
                player_id: self.id,
                hours_since_last_session,
            }),
            correlation_id,
            now,
        );
        Ok(())
    }
}

impl AggregateRoot for Player {
    type Event = StandingEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            StandingEventKind::PlayerRegistered(payload) => {
                self.registered = true;
                self.username.clone_from(&payload.username);
                self.status = GlobalStatus::Active;
            }
            StandingEventKind::PlayerSessionRecorded(payload) => {
                self.last_session_at = Some(payload.completed_at);
            }
            StandingEventKind::PlayerEliminated(_) => {
                self.status = GlobalStatus::Eliminated;
            }
            StandingEventKind::PlayerReinstated(_) => {
                self.status = GlobalStatus::Active;
            }
            StandingEventKind::PlayerForfeited(_) => {
                self.status = GlobalStatus::Forfeit;
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
