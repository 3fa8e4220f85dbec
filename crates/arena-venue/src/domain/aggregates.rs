//! Aggregate roots for the Location Registry context.

use std::collections::BTreeSet;

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    LOCATION_ACTIVATED_EVENT_TYPE, LOCATION_DEACTIVATED_EVENT_TYPE,
    LOCATION_REGISTERED_EVENT_TYPE, LocationActivated, LocationDeactivated, LocationRegistered,
    SESSION_CLOSED_EVENT_TYPE, SESSION_OPENED_EVENT_TYPE, SessionClosed, SessionOpened,
    TEMPLATE_ASSIGNED_EVENT_TYPE, TemplateAssigned, VenueEvent, VenueEventKind,
};

/// Template details cached on the location for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedTemplate {
    /// The assigned template.
    pub template_id: Uuid,
    /// Template name at assignment time.
    pub name: String,
    /// Template mode at assignment time.
    pub mode: ParticipationMode,
}

/// The aggregate root for a location.
#[derive(Debug)]
pub struct Location {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Whether `LocationRegistered` has been applied.
    pub(crate) registered: bool,
    /// Display name.
    pub(crate) name: String,
    /// Whether the location accepts new sessions.
    pub(crate) active: bool,
    /// Currently assigned template, if any.
    pub(crate) assigned_template: Option<AssignedTemplate>,
    /// Sessions started here that are still Active.
    pub(crate) open_sessions: BTreeSet<Uuid>,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<VenueEvent>,
}

impl Location {
    /// Creates a new, unregistered location aggregate.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            registered: false,
            name: String::new(),
            active: false,
            assigned_template: None,
            open_sessions: BTreeSet::new(),
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns `true` once the location has been registered.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the location accepts new sessions.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the currently assigned template, if any.
    #[must_use]
    pub fn assigned_template(&self) -> Option<&AssignedTemplate> {
        self.assigned_template.as_ref()
    }

    /// Returns the IDs of this location's Active sessions.
    #[must_use]
    pub fn open_sessions(&self) -> &BTreeSet<Uuid> {
        &self.open_sessions
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        event_type: &str,
        kind: VenueEventKind,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) {
        let metadata = EventMetadata::new(
            event_type,
            self.id,
            self.next_sequence_number(),
            correlation_id,
            clock.now(),
        );
        self.uncommitted_events.push(VenueEvent { metadata, kind });
    }

    fn ensure_registered(&self) -> Result<(), DomainError> {
        if self.registered {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    fn ensure_no_open_sessions(&self, action: &str) -> Result<(), DomainError> {
        match self.open_sessions.iter().next() {
            None => Ok(()),
            Some(session_id) => Err(DomainError::Conflict(format!(
                "cannot {action} location {} while session {session_id} is active",
                self.id
            ))),
        }
    }

    /// Registers the location, producing a `LocationRegistered` event. New
    /// locations start inactive with no template.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank, or
    /// `DomainError::Conflict` if the location is already registered.
    pub fn register(
        &mut self,
        name: &str,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.registered {
            return Err(DomainError::Conflict(format!(
                "location {} already registered",
                self.id
            )));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Validation(
                "location name must not be empty".into(),
            ));
        }

        self.record(
            LOCATION_REGISTERED_EVENT_TYPE,
            VenueEventKind::LocationRegistered(LocationRegistered {
                location_id: self.id,
                name: name.to_owned(),
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Opens the location for play, producing a `LocationActivated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the location is unknown.
    pub fn activate(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_registered()?;

        self.record(
            LOCATION_ACTIVATED_EVENT_TYPE,
            VenueEventKind::LocationActivated(LocationActivated {
                location_id: self.id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Closes the location, producing a `LocationDeactivated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the location is unknown, or
    /// `DomainError::Conflict` while any of its sessions is Active.
    pub fn deactivate(
        &mut self,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_registered()?;
        self.ensure_no_open_sessions("deactivate")?;

        self.record(
            LOCATION_DEACTIVATED_EVENT_TYPE,
            VenueEventKind::LocationDeactivated(LocationDeactivated {
                location_id: self.id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Assigns a template, producing a `TemplateAssigned` event that replaces
    /// any previously cached template details.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the location is unknown, or
    /// `DomainError::Conflict` while any of its sessions is Active.
    pub fn assign_template(
        &mut self,
        template: AssignedTemplate,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_registered()?;
        self.ensure_no_open_sessions("reassign the template of")?;

        self.record(
            TEMPLATE_ASSIGNED_EVENT_TYPE,
            VenueEventKind::TemplateAssigned(TemplateAssigned {
                location_id: self.id,
                template_id: template.template_id,
                template_name: template.name,
                mode: template.mode,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records that a session started here, producing a `SessionOpened`
    /// event. Returns the ID of the template the session must use.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the location is unknown, or
    /// `DomainError::Precondition` if the location is inactive or has no
    /// template.
    pub fn open_session(
        &mut self,
        session_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<Uuid, DomainError> {
        self.ensure_registered()?;
        if !self.active {
            return Err(DomainError::Precondition(format!(
                "location {} is inactive",
                self.id
            )));
        }
        let template_id = match &self.assigned_template {
            Some(assigned) => assigned.template_id,
            None => {
                return Err(DomainError::Precondition(format!(
                    "location {} has no assigned template",
                    self.id
                )));
            }
        };

        self.record(
            SESSION_OPENED_EVENT_TYPE,
            VenueEventKind::SessionOpened(SessionOpened {
                location_id: self.id,
                session_id,
            }),
            correlation_id,
            clock,
        );
        Ok(template_id)
    }

    /// Records that one of this location's sessions reached a terminal
    /// status, producing a `SessionClosed` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Conflict` if the session is not open here.
    pub fn close_session(
        &mut self,
        session_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if !self.open_sessions.contains(&session_id) {
            return Err(DomainError::Conflict(format!(
                "session {session_id} is not open at location {}",
                self.id
            )));
        }

        self.record(
            SESSION_CLOSED_EVENT_TYPE,
            VenueEventKind::SessionClosed(SessionClosed {
                location_id: self.id,
                session_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

impl AggregateRoot for Location {
    type Event = VenueEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            VenueEventKind::LocationRegistered(payload) => {
                self.registered = true;
                self.name.clone_from(&payload.name);
            }
            VenueEventKind::LocationActivated(_) => self.active = true,
            VenueEventKind::LocationDeactivated(_) => self.active = false,
            VenueEventKind::TemplateAssigned(payload) => {
                self.assigned_template = Some(AssignedTemplate {
                    template_id: payload.template_id,
                    name: payload.template_name.clone(),
                    mode: payload.mode,
                });
            }
            VenueEventKind::SessionOpened(payload) => {
                self.open_sessions.insert(payload.session_id);
            }
            VenueEventKind::SessionClosed(payload) => {
                self.open_sessions.remove(&payload.session_id);
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
