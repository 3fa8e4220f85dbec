//! Shared test mocks and utilities for the Arena competition engine.

mod clock;
mod notifier;
mod repository;

pub use clock::{FixedClock, TickingClock};
pub use notifier::{FailingNotifier, RecordingNotifier};
pub use repository::{
    EmptyEventRepository, FailingEventRepository, InMemoryEventRepository,
    InterleavingEventRepository, RecordingEventRepository,
};
