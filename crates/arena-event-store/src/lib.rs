//! Arena event store: PostgreSQL persistence for domain event streams.

pub mod pg_event_repository;
