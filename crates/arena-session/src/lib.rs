//! Arena: Game Session State Machine bounded context.
//!
//! Responsible for starting sessions at a location, the participant
//! roster, staged (draft) outcomes, and the exactly-once confirm that
//! feeds results back into player standing.

pub mod application;
pub mod domain;
