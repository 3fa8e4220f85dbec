//! Commands for the Location Registry context.

use arena_core::command::Command;
use uuid::Uuid;

/// Command to register a new location.
#[derive(Debug, Clone)]
pub struct RegisterLocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Display name of the station.
    pub name: String,
}

impl Command for RegisterLocation {
    fn command_type(&self) -> &'static str {
        "venue.register_location"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to open a location for play.
#[derive(Debug, Clone)]
pub struct ActivateLocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The location identifier.
    pub location_id: Uuid,
}

impl Command for ActivateLocation {
    fn command_type(&self) -> &'static str {
        "venue.activate_location"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to close a location.
#[derive(Debug, Clone)]
pub struct DeactivateLocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The location identifier.
    pub location_id: Uuid,
}

impl Command for DeactivateLocation {
    fn command_type(&self) -> &'static str {
        "venue.deactivate_location"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to change the template a location runs.
#[derive(Debug, Clone)]
pub struct AssignTemplate {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The location identifier.
    pub location_id: Uuid,
    /// The template to assign.
    pub template_id: Uuid,
}

impl Command for AssignTemplate {
    fn command_type(&self) -> &'static str {
        "venue.assign_template"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
