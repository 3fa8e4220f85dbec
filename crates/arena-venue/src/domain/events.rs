//! Domain events for the Location Registry context.

use arena_catalog::domain::participation::ParticipationMode;
use arena_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Emitted when a location is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRegistered {
    /// The location identifier.
    pub location_id: Uuid,
    /// Display name.
    pub name: String,
}

/// Emitted when a location is opened for play.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationActivated {
    /// The location identifier.
    pub location_id: Uuid,
}

/// Emitted when a location is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDeactivated {
    /// The location identifier.
    pub location_id: Uuid,
}

/// Emitted when a location is given a template.
///
/// Carries the template's name and mode at assignment time for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateAssigned {
    /// The location identifier.
    pub location_id: Uuid,
    /// The assigned template.
    pub template_id: Uuid,
    /// Template name at assignment time.
    pub template_name: String,
    /// Template mode at assignment time.
    pub mode: ParticipationMode,
}

/// Emitted when a session starts at the location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOpened {
    /// The location identifier.
    pub location_id: Uuid,
    /// The session that started.
    pub session_id: Uuid,
}

/// Emitted when one of the location's sessions is confirmed or cancelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClosed {
    /// The location identifier.
    pub location_id: Uuid,
    /// The session that closed.
    pub session_id: Uuid,
}

/// Event type identifier for [`LocationRegistered`].
pub const LOCATION_REGISTERED_EVENT_TYPE: &str = "venue.location_registered";

/// Event type identifier for [`LocationActivated`].
pub const LOCATION_ACTIVATED_EVENT_TYPE: &str = "venue.location_activated";

/// Event type identifier for [`LocationDeactivated`].
pub const LOCATION_DEACTIVATED_EVENT_TYPE: &str = "venue.location_deactivated";

/// Event type identifier for [`TemplateAssigned`].
pub const TEMPLATE_ASSIGNED_EVENT_TYPE: &str = "venue.template_assigned";

/// Event type identifier for [`SessionOpened`].
pub const SESSION_OPENED_EVENT_TYPE: &str = "venue.session_opened";

/// Event type identifier for [`SessionClosed`].
pub const SESSION_CLOSED_EVENT_TYPE: &str = "venue.session_closed";

/// Event payload variants for the Location Registry context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VenueEventKind {
    /// A location has been registered.
    LocationRegistered(LocationRegistered),
    /// A location has been opened.
    LocationActivated(LocationActivated),
    /// A location has been closed.
    LocationDeactivated(LocationDeactivated),
    /// A template has been assigned.
    TemplateAssigned(TemplateAssigned),
    /// A session has started at the location.
    SessionOpened(SessionOpened),
    /// A session at the location has closed.
    SessionClosed(SessionClosed),
}

/// Domain event envelope for the Location Registry context.
#[derive(Debug, Clone)]
pub struct VenueEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: VenueEventKind,
}

impl DomainEvent for VenueEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            VenueEventKind::LocationRegistered(_) => LOCATION_REGISTERED_EVENT_TYPE,
            VenueEventKind::LocationActivated(_) => LOCATION_ACTIVATED_EVENT_TYPE,
            VenueEventKind::LocationDeactivated(_) => LOCATION_DEACTIVATED_EVENT_TYPE,
            VenueEventKind::TemplateAssigned(_) => TEMPLATE_ASSIGNED_EVENT_TYPE,
            VenueEventKind::SessionOpened(_) => SESSION_OPENED_EVENT_TYPE,
            VenueEventKind::SessionClosed(_) => SESSION_CLOSED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("VenueEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
