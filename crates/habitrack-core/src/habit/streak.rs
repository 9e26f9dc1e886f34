//! Streak projection.
//!
//! The streak is never incremented in place. It is re-derived from the whole
//! ledger on every call, which keeps it correct when entries arrive out of
//! order at the price of a scan proportional to the ledger size.

use serde::{Deserialize, Serialize};

use super::{Ledger, LogNote};

/// Incomplete runs at or above this count reset the streak.
pub const INCOMPLETE_RUN_LIMIT: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakProjection {
    pub success_count: u64,
    pub incomplete_runs: u64,
    pub streak: u32,
}

/// Derive the streak from `ledger`.
///
/// `incomplete_runs` counts "marked as incomplete" entries that open the
/// ledger or directly follow another "marked as incomplete" entry, looking
/// at every entry regardless of note class.
pub fn calculate_streak(ledger: &Ledger) -> StreakProjection {
    let success_count = ledger
        .iter()
        .filter(|e| e.note == LogNote::Completed)
        .count() as u64;

    let mut incomplete_runs = 0;
    let mut previous: Option<&LogNote> = None;
    for entry in ledger {
        if entry.note == LogNote::MarkedIncomplete
            && previous.map_or(true, |p| *p == LogNote::MarkedIncomplete)
        {
            incomplete_runs += 1;
        }
        previous = Some(&entry.note);
    }

    let streak = if success_count > 0 && incomplete_runs < INCOMPLETE_RUN_LIMIT {
        u32::try_from(success_count).unwrap_or(u32::MAX)
    } else {
        0
    };

    StreakProjection {
        success_count,
        incomplete_runs,
        streak,
    }
}
