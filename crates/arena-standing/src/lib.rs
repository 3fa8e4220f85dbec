//! Arena: Player Standing & Forfeit Timer bounded context.
//!
//! Responsible for player registration, each player's global status, and
//! the inactivity countdown that leads to an automatic forfeit.

pub mod application;
pub mod domain;
