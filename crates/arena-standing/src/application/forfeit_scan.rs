//! Periodic forfeit scan.
//!
//! Walks every registered player once: players past the forfeit threshold
//! are forfeited, players inside the warning window are notified. The
//! caller owns the schedule.

use arena_core::clock::Clock;
use arena_core::error::DomainError;
use arena_core::notification::{ForfeitNotifier, ForfeitWarning};
use arena_core::repository::EventRepository;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::command_handlers::{handle_forfeit_player, reconstitute};
use crate::domain::commands::ForfeitPlayer;
use crate::domain::events::PLAYER_REGISTERED_EVENT_TYPE;
use crate::domain::forfeit;

/// Outcome of one pass over all players.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    /// Players that were sent a forfeit warning.
    pub warned: Vec<Uuid>,
    /// Players that were forfeited.
    pub forfeited: Vec<Uuid>,
    /// Number of warnings the notifier failed to deliver.
    pub failed_notifications: usize,
}

/// Runs the forfeit scan at the clock's current time.
///
/// A player whose stream moves between the read and the forfeit write (for
/// example because a session was just confirmed) is skipped; the next scan
/// re-evaluates it. Notification failures are logged and counted.
///
/// # Errors
///
/// Returns the repository's error if listing, loading or appending fails for
/// any reason other than a lost race.
pub async fn scan_standings(
    clock: &dyn Clock,
    repo: &dyn EventRepository,
    notifier: &dyn ForfeitNotifier,
) -> Result<ScanReport, DomainError> {
    let now = clock.now();
    let correlation_id = Uuid::new_v4();
    let mut report = ScanReport::default();

    for player_id in repo.list_aggregate_ids(PLAYER_REGISTERED_EVENT_TYPE).await? {
        let stored_events = repo.load_events(player_id).await?;
        let player = reconstitute(player_id, &stored_events)?;

        if forfeit::is_forfeit_eligible(&player, now) {
            let command = ForfeitPlayer {
                correlation_id,
                player_id,
            };
            match handle_forfeit_player(&command, clock, repo).await {
                Ok(_) => report.forfeited.push(player_id),
                Err(DomainError::Precondition(_)) => {}
                Err(e) if e.is_conflict() => {
                    warn!(%player_id, error = %e, "forfeit skipped, player changed during scan");
                }
                Err(e) => return Err(e),
            }
        } else if forfeit::is_approaching_forfeit(&player, now) {
            let warning = ForfeitWarning {
                player_id,
                username: player.username().to_owned(),
                hours_since_last_session: forfeit::hours_since_last_session(&player, now)
                    .unwrap_or_default(),
            };
            match notifier.send_forfeit_warning(&warning).await {
                Ok(()) => report.warned.push(player_id),
                Err(e) => {
                    warn!(%player_id, error = %e, "forfeit warning not delivered");
                    report.failed_notifications += 1;
                }
            }
        }
    }

    info!(
        %correlation_id,
        warned = report.warned.len(),
        forfeited = report.forfeited.len(),
        failed_notifications = report.failed_notifications,
        "forfeit scan finished"
    );
    Ok(report)
}

/// A notifier that only writes warnings to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl ForfeitNotifier for TracingNotifier {
    async fn send_forfeit_warning(&self, warning: &ForfeitWarning) -> Result<(), DomainError> {
        info!(
            player_id = %warning.player_id,
            username = %warning.username,
            hours_since_last_session = warning.hours_since_last_session,
            "forfeit warning"
        );
        Ok(())
    }
}
