//! Arena Core: shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that every bounded
//! context (catalog, venue, session, standing) depends on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod notification;
pub mod repository;
