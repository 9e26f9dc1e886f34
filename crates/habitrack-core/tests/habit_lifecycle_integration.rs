//! Integration tests for the habit lifecycle.
//!
//! These drive [`HabitTracker`] over a file-backed database with a manual
//! clock, checking the ledger and the stored habit after every transition.

use chrono::{DateTime, Duration, TimeZone, Utc};
use habitrack_core::{
    Clock, CoreError, Database, DeactivationOutcome, Habit, HabitChanges, HabitDraft,
    HabitState, HabitStore, HabitTracker, LogFilter, LogNote, ManualClock, Outcome, Periodicity,
    StatusOutcome, ValidationError,
};
use tempfile::TempDir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 23, 16, 30, 0).unwrap()
}

fn setup(dir: &TempDir) -> (HabitTracker<Database, ManualClock>, i64) {
    let db = Database::open_at(&dir.path().join("habitrack.db")).unwrap();
    let owner = db.create_user("user123", "hash", t0()).unwrap();
    (HabitTracker::new(db, ManualClock::new(t0())), owner)
}

fn notes(tracker: &HabitTracker<Database, ManualClock>, habit_id: i64) -> Vec<String> {
    tracker
        .store()
        .ledger(habit_id)
        .unwrap()
        .iter()
        .map(|e| e.note.to_string())
        .collect()
}

#[test]
fn test_overdue_daily_habit_marks_incomplete_and_stays_overdue() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);
    let mut habit = tracker
        .create_habit(owner, &HabitDraft::new("Run", "morning run", Periodicity::Daily, 1))
        .unwrap();
    assert_eq!(habit.deadline, t0() + Duration::days(1));

    tracker.clock().advance(Duration::days(2));
    assert_eq!(habit.state(tracker.clock().now()), HabitState::ActiveOverdue);
    assert_eq!(
        tracker.update_status(&mut habit).unwrap(),
        StatusOutcome::MarkedIncomplete
    );
    assert_eq!(habit.streak, 0);

    // The deadline is not advanced by a check.
    assert_eq!(
        tracker.update_status(&mut habit).unwrap(),
        StatusOutcome::MarkedIncomplete
    );
    assert_eq!(
        notes(&tracker, habit.id),
        vec![
            "Habit created and activated",
            "Habit marked as incomplete",
            "Habit marked as incomplete",
        ]
    );
}

#[test]
fn test_deactivate_then_restart() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);
    let mut habit = tracker
        .create_habit(owner, &HabitDraft::new("Run", "morning run", Periodicity::Daily, 1))
        .unwrap();

    assert_eq!(tracker.deactivate(&mut habit).unwrap(), DeactivationOutcome::NotDue);

    tracker.clock().advance(Duration::days(1));
    assert_eq!(
        tracker.deactivate(&mut habit).unwrap(),
        DeactivationOutcome::NotDue,
        "deadline must be strictly in the past"
    );

    tracker.clock().advance(Duration::seconds(1));
    assert_eq!(tracker.deactivate(&mut habit).unwrap(), DeactivationOutcome::Deactivated);
    assert!(!tracker.load_habit(habit.id).unwrap().active);

    let before = tracker.store().count_logs(habit.id, &LogFilter::All).unwrap();
    assert_eq!(
        tracker.deactivate(&mut habit).unwrap(),
        DeactivationOutcome::AlreadyInactive
    );
    assert_eq!(
        tracker.store().count_logs(habit.id, &LogFilter::All).unwrap(),
        before
    );

    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Inactive);
    assert_eq!(
        tracker
            .store()
            .count_logs(habit.id, &LogFilter::Note(LogNote::UpdateFailedInactive))
            .unwrap(),
        1
    );

    let changes = HabitChanges {
        periodicity: Some(Periodicity::Weekly),
        ..HabitChanges::default()
    };
    tracker.update_habit(&mut habit, &changes).unwrap();
    let now = t0() + Duration::days(1) + Duration::seconds(1);
    assert!(habit.active);
    assert_eq!(habit.deadline, now + Duration::days(7));
    assert_eq!(tracker.load_habit(habit.id).unwrap(), habit);
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
}

#[test]
fn test_five_daily_completions_build_a_streak_of_five() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);
    let mut habit = tracker
        .create_habit(owner, &HabitDraft::new("Journal", "write", Periodicity::Daily, 10))
        .unwrap();

    for day in 1..=5 {
        assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
        assert_eq!(habit.streak, day);
        assert_eq!(
            tracker.update_status(&mut habit).unwrap(),
            StatusOutcome::NotYetDue
        );
        tracker.clock().advance(Duration::days(1));
    }

    assert_eq!(tracker.current_streak(&mut habit).unwrap(), 5);
    assert_eq!(tracker.current_streak(&mut habit).unwrap(), 5);
}

#[test]
fn test_weekly_cooldown_boundary() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);
    let mut habit = tracker
        .create_habit(owner, &HabitDraft::new("Shop", "groceries", Periodicity::Weekly, 4))
        .unwrap();
    assert_eq!(habit.deadline, t0() + Duration::days(28));

    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
    tracker.clock().set(t0() + Duration::weeks(1) - Duration::seconds(1));
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::NotYetDue);
    tracker.clock().set(t0() + Duration::weeks(1));
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
    assert_eq!(habit.streak, 2);
}

#[test]
fn test_three_incomplete_runs_reset_the_streak() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);
    let mut habit = tracker
        .create_habit(owner, &HabitDraft::new("Read", "a chapter", Periodicity::Daily, 30))
        .unwrap();

    let miss = |tracker: &HabitTracker<Database, ManualClock>, habit: &Habit| {
        tracker.clock().advance(Duration::hours(1));
        let now = tracker.clock().now();
        tracker
            .store()
            .append_log(habit.id, Outcome::Failure, &LogNote::MarkedIncomplete, now)
            .unwrap();
    };

    miss(&tracker, &habit);
    miss(&tracker, &habit);
    tracker.clock().advance(Duration::hours(1));
    let now = tracker.clock().now();
    tracker
        .store()
        .append_log(habit.id, Outcome::Success, &LogNote::Completed, now)
        .unwrap();
    miss(&tracker, &habit);
    assert_eq!(tracker.current_streak(&mut habit).unwrap(), 1);

    miss(&tracker, &habit);
    assert_eq!(tracker.current_streak(&mut habit).unwrap(), 1);

    miss(&tracker, &habit);
    assert_eq!(tracker.current_streak(&mut habit).unwrap(), 0);

    // With the streak at zero the cooldown is bypassed.
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
    assert_eq!(habit.streak, 0);
}

#[test]
fn test_free_text_entries_do_not_gate_or_count() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);
    let mut habit = tracker
        .create_habit(owner, &HabitDraft::new("Run", "morning run", Periodicity::Daily, 3))
        .unwrap();
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);

    tracker.clock().advance(Duration::days(1));
    tracker
        .add_note(&habit, Outcome::Success, "felt great")
        .unwrap();
    assert!(tracker.can_mark_complete(&habit).unwrap());
    assert_eq!(tracker.update_status(&mut habit).unwrap(), StatusOutcome::Completed);
    assert_eq!(habit.streak, 2);
}

#[test]
fn test_validation_and_not_found_leave_no_trace() {
    let dir = TempDir::new().unwrap();
    let (tracker, owner) = setup(&dir);

    let err = tracker
        .create_habit(owner, &HabitDraft::new("Run", "x", Periodicity::Daily, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Validation(ValidationError::NonPositiveDuration(0))
    ));
    let err = tracker
        .create_habit(owner, &HabitDraft::new(" ", "x", Periodicity::Daily, 1))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(tracker.habits_for_user(owner).unwrap().is_empty());

    let err = tracker.load_habit(999).unwrap_err();
    assert_eq!(err.to_string(), "habit not found: 999");
}

#[test]
fn test_state_survives_reopen_and_delete_cascades() {
    let dir = TempDir::new().unwrap();
    let habit_id = {
        let (tracker, owner) = setup(&dir);
        let mut habit = tracker
            .create_habit(owner, &HabitDraft::new("Run", "morning run", Periodicity::Daily, 2))
            .unwrap();
        tracker.update_status(&mut habit).unwrap();
        habit.id
    };

    let db = Database::open_at(&dir.path().join("habitrack.db")).unwrap();
    let tracker = HabitTracker::new(db, ManualClock::new(t0() + Duration::days(1)));
    let habit = tracker.load_habit(habit_id).unwrap();
    assert_eq!(habit.streak, 1);
    assert_eq!(habit.created_at, t0());
    assert_eq!(tracker.ledger(&habit).unwrap().len(), 2);

    tracker.delete_habit(habit).unwrap();
    assert!(tracker.store().load_habit(habit_id).unwrap().is_none());
    assert_eq!(
        tracker.store().count_logs(habit_id, &LogFilter::All).unwrap(),
        0
    );
}
