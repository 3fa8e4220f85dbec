//! Commands for the Template Catalog context.

use arena_core::command::Command;
use uuid::Uuid;

use super::participation::ParticipationMode;

/// Command to create a new template.
#[derive(Debug, Clone)]
pub struct CreateTemplate {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// How players take part.
    pub mode: ParticipationMode,
}

impl Command for CreateTemplate {
    fn command_type(&self) -> &'static str {
        "catalog.create_template"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to edit an existing template.
#[derive(Debug, Clone)]
pub struct UpdateTemplate {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The template identifier.
    pub template_id: Uuid,
    /// New display name.
    pub name: String,
    /// New description.
    pub description: String,
    /// New participation mode.
    pub mode: ParticipationMode,
}

impl Command for UpdateTemplate {
    fn command_type(&self) -> &'static str {
        "catalog.update_template"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to withdraw a template from the catalog.
#[derive(Debug, Clone)]
pub struct RetireTemplate {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The template identifier.
    pub template_id: Uuid,
}

impl Command for RetireTemplate {
    fn command_type(&self) -> &'static str {
        "catalog.retire_template"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
