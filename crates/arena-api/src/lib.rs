//! Arena API: HTTP surface, configuration and telemetry for the
//! competition engine.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
