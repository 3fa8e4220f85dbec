//! Domain events for the Template Catalog context.

use arena_core::event::{DomainEvent, EventMetadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::participation::ParticipationMode;

/// Emitted when a template is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateCreated {
    /// The template identifier.
    pub template_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description shown to players.
    pub description: String,
    /// How players take part.
    pub mode: ParticipationMode,
}

/// Emitted when a template's details are edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateUpdated {
    /// The template identifier.
    pub template_id: Uuid,
    /// New display name.
    pub name: String,
    /// New description.
    pub description: String,
    /// New participation mode.
    pub mode: ParticipationMode,
}

/// Emitted when a template is withdrawn from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRetired {
    /// The template identifier.
    pub template_id: Uuid,
}

/// Emitted when a location takes the template into active use, either by
/// assignment or by activating a location it is assigned to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateReferenced {
    /// The template identifier.
    pub template_id: Uuid,
    /// The location now using the template.
    pub location_id: Uuid,
}

/// Event type identifier for [`TemplateCreated`].
pub const TEMPLATE_CREATED_EVENT_TYPE: &str = "catalog.template_created";

/// Event type identifier for [`TemplateUpdated`].
pub const TEMPLATE_UPDATED_EVENT_TYPE: &str = "catalog.template_updated";

/// Event type identifier for [`TemplateRetired`].
pub const TEMPLATE_RETIRED_EVENT_TYPE: &str = "catalog.template_retired";

/// Event type identifier for [`TemplateReferenced`].
pub const TEMPLATE_REFERENCED_EVENT_TYPE: &str = "catalog.template_referenced";

/// Event payload variants for the Template Catalog context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CatalogEventKind {
    /// A template has been created.
    TemplateCreated(TemplateCreated),
    /// A template has been edited.
    TemplateUpdated(TemplateUpdated),
    /// A template has been retired.
    TemplateRetired(TemplateRetired),
    /// A location has started using a template.
    TemplateReferenced(TemplateReferenced),
}

/// Domain event envelope for the Template Catalog context.
#[derive(Debug, Clone)]
pub struct CatalogEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: CatalogEventKind,
}

impl DomainEvent for CatalogEvent {
    fn event_type(&self) -> &'static str {
        match &self.kind {
            CatalogEventKind::TemplateCreated(_) => TEMPLATE_CREATED_EVENT_TYPE,
            CatalogEventKind::TemplateUpdated(_) => TEMPLATE_UPDATED_EVENT_TYPE,
            CatalogEventKind::TemplateRetired(_) => TEMPLATE_RETIRED_EVENT_TYPE,
            CatalogEventKind::TemplateReferenced(_) => TEMPLATE_REFERENCED_EVENT_TYPE,
        }
    }

    fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        serde_json::to_value(&self.kind).expect("CatalogEventKind serialization is infallible")
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
