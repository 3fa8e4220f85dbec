//! Outbound notification abstraction.
//!
//! Delivery is an external concern; the engine only decides whom to notify
//! and builds the payload.

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::error::DomainError;

/// Payload sent to a player approaching the forfeit threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForfeitWarning {
    /// The player being warned.
    pub player_id: Uuid,
    /// The player's username.
    pub username: String,
    /// Whole hours elapsed since the player's last completed session.
    pub hours_since_last_session: i64,
}

/// Sends forfeit warnings through an out-of-band channel.
#[async_trait]
pub trait ForfeitNotifier: Send + Sync {
    /// Dispatches a single warning.
    async fn send_forfeit_warning(&self, warning: &ForfeitWarning) -> Result<(), DomainError>;
}
