//! Aggregate views over habits and their ledgers.
//!
//! These are read-only pass-through queries. They consume the streak values
//! the tracker stores but never re-project or write anything.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::habit::{Habit, LogFilter, LogNote, Outcome, Periodicity};
use crate::storage::HabitStore;

/// Summary of one habit's ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogAnalysis {
    pub total_logs: u64,
    pub success_logs: u64,
    pub failure_logs: u64,
    /// Entries noted "completed successfully on time"
    pub completed: u64,
    /// Entries noted "marked as incomplete"
    pub incomplete: u64,
    /// Distinct notes, sorted
    pub notes: Vec<String>,
}

pub fn active_habits<S: HabitStore>(store: &S, user_id: i64) -> Result<Vec<Habit>> {
    Ok(store
        .habits_for_user(user_id)?
        .into_iter()
        .filter(|h| h.active)
        .collect())
}

pub fn habits_by_periodicity<S: HabitStore>(
    store: &S,
    user_id: i64,
    periodicity: &Periodicity,
) -> Result<Vec<Habit>> {
    Ok(store
        .habits_for_user(user_id)?
        .into_iter()
        .filter(|h| h.periodicity == *periodicity)
        .collect())
}

/// The user's habit with the highest stored streak. Ties go to the older habit.
pub fn longest_streak<S: HabitStore>(store: &S, user_id: i64) -> Result<Option<Habit>> {
    let habits = store.habits_for_user(user_id)?;
    Ok(habits
        .into_iter()
        .rev()
        .max_by_key(|h| h.streak))
}

pub fn streak_for_habit<S: HabitStore>(store: &S, habit_id: i64) -> Result<u32> {
    store
        .load_habit(habit_id)?
        .map(|h| h.streak)
        .ok_or_else(|| CoreError::habit_not_found(habit_id))
}

/// Completed checks as a percentage of all completed and incomplete checks.
///
/// 0.0 when the habit has never been checked.
pub fn completion_rate<S: HabitStore>(store: &S, habit_id: i64) -> Result<f64> {
    let completed = store.count_logs(habit_id, &LogFilter::Note(LogNote::Completed))?;
    let incomplete = store.count_logs(habit_id, &LogFilter::Note(LogNote::MarkedIncomplete))?;
    let total = completed + incomplete;
    if total == 0 {
        return Ok(0.0);
    }
    Ok(completed as f64 / total as f64 * 100.0)
}

pub fn analyze_logs<S: HabitStore>(store: &S, habit_id: i64) -> Result<LogAnalysis> {
    let ledger = store.ledger(habit_id)?;
    let notes: BTreeSet<String> = ledger.iter().map(|e| e.note.to_string()).collect();
    Ok(LogAnalysis {
        total_logs: ledger.len() as u64,
        success_logs: store.count_logs(habit_id, &LogFilter::Outcome(Outcome::Success))?,
        failure_logs: store.count_logs(habit_id, &LogFilter::Outcome(Outcome::Failure))?,
        completed: store.count_logs(habit_id, &LogFilter::Note(LogNote::Completed))?,
        incomplete: store.count_logs(habit_id, &LogFilter::Note(LogNote::MarkedIncomplete))?,
        notes: notes.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::habit::{HabitDraft, HabitTracker};
    use crate::storage::Database;
    use chrono::{Duration, TimeZone, Utc};

    fn setup() -> (HabitTracker<Database, ManualClock>, i64) {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 23, 16, 30, 0).unwrap();
        let db = Database::open_memory().unwrap();
        let owner = db.create_user("user123", "hash", t0).unwrap();
        (HabitTracker::new(db, ManualClock::new(t0)), owner)
    }

    fn create(
        tracker: &HabitTracker<Database, ManualClock>,
        owner: i64,
        name: &str,
        periodicity: Periodicity,
    ) -> Habit {
        tracker
            .create_habit(owner, &HabitDraft::new(name, "desc", periodicity, 4))
            .unwrap()
    }

    #[test]
    fn filters_by_activity_and_periodicity() {
        let (tracker, owner) = setup();
        let mut run = create(&tracker, owner, "Run", Periodicity::Daily);
        create(&tracker, owner, "Shop", Periodicity::Weekly);
        tracker.clock().advance(Duration::days(5));
        tracker.deactivate(&mut run).unwrap();

        let active = active_habits(tracker.store(), owner).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Shop");

        let daily = habits_by_periodicity(tracker.store(), owner, &Periodicity::Daily).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].name, "Run");
    }

    #[test]
    fn longest_streak_picks_highest_and_handles_empty() {
        let (tracker, owner) = setup();
        assert!(longest_streak(tracker.store(), owner).unwrap().is_none());

        let mut a = create(&tracker, owner, "A", Periodicity::Daily);
        let mut b = create(&tracker, owner, "B", Periodicity::Daily);
        tracker.update_status(&mut a).unwrap();
        tracker.update_status(&mut b).unwrap();
        tracker.clock().advance(Duration::days(1));
        tracker.update_status(&mut b).unwrap();

        let best = longest_streak(tracker.store(), owner).unwrap().unwrap();
        assert_eq!(best.id, b.id);
        assert_eq!(best.streak, 2);
        assert_eq!(streak_for_habit(tracker.store(), a.id).unwrap(), 1);
        assert!(streak_for_habit(tracker.store(), 9_999).is_err());
    }

    #[test]
    fn longest_streak_tie_goes_to_first_habit() {
        let (tracker, owner) = setup();
        let first = create(&tracker, owner, "First", Periodicity::Daily);
        create(&tracker, owner, "Second", Periodicity::Daily);
        let best = longest_streak(tracker.store(), owner).unwrap().unwrap();
        assert_eq!(best.id, first.id);
    }

    #[test]
    fn completion_rate_and_log_analysis() {
        let (tracker, owner) = setup();
        let mut habit = create(&tracker, owner, "Run", Periodicity::Daily);
        assert_eq!(completion_rate(tracker.store(), habit.id).unwrap(), 0.0);

        tracker.update_status(&mut habit).unwrap();
        tracker.clock().advance(Duration::days(1));
        tracker.update_status(&mut habit).unwrap();
        tracker.clock().advance(Duration::days(1));
        tracker.update_status(&mut habit).unwrap();
        tracker.clock().advance(Duration::days(3));
        tracker.update_status(&mut habit).unwrap();

        let rate = completion_rate(tracker.store(), habit.id).unwrap();
        assert!((rate - 75.0).abs() < f64::EPSILON);

        let analysis = analyze_logs(tracker.store(), habit.id).unwrap();
        assert_eq!(analysis.total_logs, 5);
        assert_eq!(analysis.success_logs, 4);
        assert_eq!(analysis.failure_logs, 1);
        assert_eq!(analysis.completed, 3);
        assert_eq!(analysis.incomplete, 1);
        assert_eq!(
            analysis.notes,
            vec![
                "Habit completed successfully on time".to_string(),
                "Habit created and activated".to_string(),
                "Habit marked as incomplete".to_string(),
            ]
        );
    }
}
