//! Domain layer for the Location Registry context.

pub mod aggregates;
pub mod commands;
pub mod events;
