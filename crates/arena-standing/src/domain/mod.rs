//! Domain layer for the Player Standing context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod forfeit;
