//! Test notifiers: mock `ForfeitNotifier` implementations for tests.

use std::sync::Mutex;

use arena_core::error::DomainError;
use arena_core::notification::{ForfeitNotifier, ForfeitWarning};
use async_trait::async_trait;

/// A notifier that records every warning it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ForfeitWarning>>,
}

impl RecordingNotifier {
    /// Creates an empty recording notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all warnings sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn sent(&self) -> Vec<ForfeitWarning> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForfeitNotifier for RecordingNotifier {
    async fn send_forfeit_warning(&self, warning: &ForfeitWarning) -> Result<(), DomainError> {
        self.sent.lock().unwrap().push(warning.clone());
        Ok(())
    }
}

/// A notifier whose channel is always down.
#[derive(Debug)]
pub struct FailingNotifier;

#[async_trait]
impl ForfeitNotifier for FailingNotifier {
    async fn send_forfeit_warning(&self, _warning: &ForfeitWarning) -> Result<(), DomainError> {
        Err(DomainError::Infrastructure("notification channel unavailable".into()))
    }
}
