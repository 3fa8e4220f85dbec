//! Arena: Template Catalog bounded context.
//!
//! Responsible for the reusable session blueprints (name, participation
//! mode, descriptive metadata) that locations are assigned and that
//! sessions snapshot at start.

pub mod application;
pub mod domain;
