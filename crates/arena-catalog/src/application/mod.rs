//! Application layer for the Template Catalog context.

pub mod command_handlers;
pub mod query_handlers;
