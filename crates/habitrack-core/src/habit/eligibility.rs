//! Completion eligibility gate.

use chrono::{DateTime, Duration, Utc};

use super::{Habit, LogEntry, Periodicity};

pub const DAILY_COOLDOWN_SECS: i64 = 86_400;
pub const WEEKLY_COOLDOWN_SECS: i64 = 604_800;

/// Whether a completion may be recorded at `now`.
///
/// `last_qualifying` is the most recent "completed" or "marked incomplete"
/// entry. With no such entry the first check always passes. A zero streak
/// bypasses the cooldown entirely, so a habit can be completed immediately
/// after a reset.
pub fn can_mark_complete(
    habit: &Habit,
    last_qualifying: Option<&LogEntry>,
    now: DateTime<Utc>,
) -> bool {
    let Some(last) = last_qualifying else {
        return true;
    };
    if habit.streak == 0 {
        return true;
    }
    let cooldown = match habit.periodicity {
        Periodicity::Daily => DAILY_COOLDOWN_SECS,
        Periodicity::Weekly => WEEKLY_COOLDOWN_SECS,
        Periodicity::Other(_) => return true,
    };
    now - last.timestamp >= Duration::seconds(cooldown)
}
