//! Arena: Location Registry bounded context.
//!
//! Responsible for check-in stations: whether they are open, which
//! template they currently run, and which of their sessions are still
//! Active.

pub mod application;
pub mod domain;
