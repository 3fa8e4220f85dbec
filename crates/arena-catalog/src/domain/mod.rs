//! Domain layer for the Template Catalog context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod participation;
