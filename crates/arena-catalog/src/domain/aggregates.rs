//! Aggregate roots for the Template Catalog context.

use arena_core::aggregate::AggregateRoot;
use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::event::EventMetadata;
use uuid::Uuid;

use super::events::{
    CatalogEvent, CatalogEventKind, TEMPLATE_CREATED_EVENT_TYPE, TEMPLATE_REFERENCED_EVENT_TYPE,
    TEMPLATE_RETIRED_EVENT_TYPE, TEMPLATE_UPDATED_EVENT_TYPE, TemplateCreated,
    TemplateReferenced, TemplateRetired, TemplateUpdated,
};
use super::participation::ParticipationMode;

/// The aggregate root for a session template.
#[derive(Debug)]
pub struct Template {
    /// Aggregate identifier.
    pub id: Uuid,
    /// Current version (event count).
    pub(crate) version: i64,
    /// Display name.
    pub(crate) name: String,
    /// Free-form description.
    pub(crate) description: String,
    /// Participation mode (set after `TemplateCreated`).
    pub(crate) mode: Option<ParticipationMode>,
    /// Whether the template has been withdrawn.
    pub(crate) retired: bool,
    /// Uncommitted events pending persistence.
    uncommitted_events: Vec<CatalogEvent>,
}

impl Template {
    /// Creates a new, empty template aggregate.
    #[must_use]
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            version: 0,
            name: String::new(),
            description: String::new(),
            mode: None,
            retired: false,
            uncommitted_events: Vec::new(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the participation mode, or `None` before creation.
    #[must_use]
    pub fn mode(&self) -> Option<ParticipationMode> {
        self.mode
    }

    /// Returns `true` once the template has been retired.
    #[must_use]
    pub fn is_retired(&self) -> bool {
        self.retired
    }

    /// Returns `true` if the template exists and has not been retired.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.mode.is_some() && !self.retired
    }

    /// Returns the next sequence number for a new event.
    #[allow(clippy::cast_possible_wrap)]
    fn next_sequence_number(&self) -> i64 {
        self.version + self.uncommitted_events.len() as i64 + 1
    }

    fn record(
        &mut self,
        event_type: &str,
        kind: CatalogEventKind,
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
        self.uncommitted_events.push(CatalogEvent { metadata, kind });
    }

    fn ensure_available(&self) -> Result<(), DomainError> {
        if self.is_available() {
            Ok(())
        } else {
            Err(DomainError::AggregateNotFound(self.id))
        }
    }

    /// Creates the template, producing a `TemplateCreated` event.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the name is blank, or
    /// `DomainError::Conflict` if the template already exists.
    pub fn create(
        &mut self,
        name: &str,
        description: &str,
        mode: ParticipationMode,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        if self.mode.is_some() {
            return Err(DomainError::Conflict(format!(
                "template {} already exists",
                self.id
            )));
        }
        let name = validated_name(name)?;

        self.record(
            TEMPLATE_CREATED_EVENT_TYPE,
            CatalogEventKind::TemplateCreated(TemplateCreated {
                template_id: self.id,
                name,
                description: description.trim().to_owned(),
                mode,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Edits the template, producing a `TemplateUpdated` event.
    ///
    /// Sessions already started keep the name and mode they snapshotted.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the template does not exist
    /// or is retired, and `DomainError::Validation` if the name is blank.
    pub fn update(
        &mut self,
        name: &str,
        description: &str,
        mode: ParticipationMode,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_available()?;
        let name = validated_name(name)?;

        self.record(
            TEMPLATE_UPDATED_EVENT_TYPE,
            CatalogEventKind::TemplateUpdated(TemplateUpdated {
                template_id: self.id,
                name,
                description: description.trim().to_owned(),
                mode,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Retires the template, producing a `TemplateRetired` event.
    ///
    /// Whether the template is still referenced is checked by the caller,
    /// which can see locations and sessions.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the template does not exist
    /// or is already retired.
    pub fn retire(&mut self, correlation_id: Uuid, clock: &dyn Clock) -> Result<(), DomainError> {
        self.ensure_available()?;

        self.record(
            TEMPLATE_RETIRED_EVENT_TYPE,
            CatalogEventKind::TemplateRetired(TemplateRetired {
                template_id: self.id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }

    /// Records that a location has taken the template into use, producing a
    /// `TemplateReferenced` event.
    ///
    /// The event moves the stream version, so a retirement that checked
    /// usage against the earlier version fails its conditional append.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::AggregateNotFound` if the template does not exist
    /// or is retired.
    pub fn record_reference(
        &mut self,
        location_id: Uuid,
        correlation_id: Uuid,
        clock: &dyn Clock,
    ) -> Result<(), DomainError> {
        self.ensure_available()?;

        self.record(
            TEMPLATE_REFERENCED_EVENT_TYPE,
            CatalogEventKind::TemplateReferenced(TemplateReferenced {
                template_id: self.id,
                location_id,
            }),
            correlation_id,
            clock,
        );
        Ok(())
    }
}

fn validated_name(name: &str) -> Result<String, DomainError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DomainError::Validation(
            "template name must not be empty".into(),
        ));
    }
    Ok(trimmed.to_owned())
}

impl AggregateRoot for Template {
    type Event = CatalogEvent;

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn version(&self) -> i64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match &event.kind {
            CatalogEventKind::TemplateCreated(payload) => {
                self.name.clone_from(&payload.name);
                self.description.clone_from(&payload.description);
                self.mode = Some(payload.mode);
            }
            CatalogEventKind::TemplateUpdated(payload) => {
                self.name.clone_from(&payload.name);
                self.description.clone_from(&payload.description);
                self.mode = Some(payload.mode);
            }
            CatalogEventKind::TemplateRetired(_) => {
                self.retired = true;
            }
            CatalogEventKind::TemplateReferenced(_) => {}
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
