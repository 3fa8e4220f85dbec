//! Application layer for the Location Registry context.

pub mod command_handlers;
pub mod query_handlers;
