//! Application layer for the Player Standing context.

pub mod command_handlers;
pub mod forfeit_scan;
pub mod query_handlers;
