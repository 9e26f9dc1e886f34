pub mod analytics;
pub mod config;
pub mod demo;
pub mod habit;
pub mod user;

use habitrack_core::{
    Accounts, Clock, CoreError, Database, Habit, HabitTracker, SystemClock, User,
};
use serde::Serialize;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn open_tracker() -> Result<HabitTracker<Database, SystemClock>, CoreError> {
    Ok(HabitTracker::new(Database::open()?, SystemClock))
}

pub(crate) fn find_user(db: &Database, username: &str) -> Result<User, CoreError> {
    Accounts::new(db, SystemClock).find(username)
}

/// Load a habit owned by `user`. Someone else's habit is reported as missing.
pub(crate) fn owned_habit<C: Clock>(
    tracker: &HabitTracker<Database, C>,
    user: &User,
    habit_id: i64,
) -> Result<Habit, CoreError> {
    let habit = tracker.load_habit(habit_id)?;
    if habit.user_id != user.id {
        return Err(CoreError::habit_not_found(habit_id));
    }
    Ok(habit)
}
