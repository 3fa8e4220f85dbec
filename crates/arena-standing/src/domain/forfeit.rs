//! Forfeit countdown rules.
//!
//! These are pure functions of a player's state and an instant; nothing
//! here schedules timers or touches the store.

use chrono::{DateTime, Duration, Utc};

use super::aggregates::{GlobalStatus, Player};

/// Inactivity after which an Active player may be forfeited.
pub const FORFEIT_THRESHOLD_HOURS: i64 = 72;

/// Inactivity after which an Active player is warned.
pub const WARNING_THRESHOLD_HOURS: i64 = 48;

fn time_since_last_session(player: &Player, now: DateTime<Utc>) -> Option<Duration> {
    player.last_session_at().map(|at| now - at)
}

/// Whole hours elapsed since the player's last completed session, or `None`
/// if the player has never completed one.
#[must_use]
pub fn hours_since_last_session(player: &Player, now: DateTime<Utc>) -> Option<i64> {
    time_since_last_session(player, now).map(|elapsed| elapsed.num_hours())
}

/// Returns `true` if the player is Active and more than
/// [`FORFEIT_THRESHOLD_HOURS`] have passed since their last session.
///
/// A player who has never completed a session has no countdown running.
#[must_use]
pub fn is_forfeit_eligible(player: &Player, now: DateTime<Utc>) -> bool {
    player.status() == GlobalStatus::Active
        && time_since_last_session(player, now)
            .is_some_and(|elapsed| elapsed > Duration::hours(FORFEIT_THRESHOLD_HOURS))
}

/// Returns `true` if the player is Active and the time since their last
/// session lies in `[48h, 72h)`.
#[must_use]
pub fn is_approaching_forfeit(player: &Player, now: DateTime<Utc>) -> bool {
    player.status() == GlobalStatus::Active
        && time_since_last_session(player, now).is_some_and(|elapsed| {
            elapsed >= Duration::hours(WARNING_THRESHOLD_HOURS)
                && elapsed < Duration::hours(FORFEIT_THRESHOLD_HOURS)
        })
}
