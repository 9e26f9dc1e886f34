mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, DefaultsConfig, LoggingConfig, StorageConfig};
pub use database::Database;

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::habit::{Habit, Ledger, LogEntry, LogFilter, LogNote, Outcome};

/// Returns the data directory, creating it if needed.
///
/// `HABITRACK_DATA_DIR` wins when set. Otherwise `~/.config/habitrack`, or
/// `~/.config/habitrack-dev` with `HABITRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("HABITRACK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("HABITRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("habitrack-dev")
            } else {
                base_dir.join("habitrack")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Persistence the habit lifecycle depends on.
///
/// Implementations keep each habit's log entries in ledger order
/// (timestamp, then insertion order) and remove them together with the habit.
pub trait HabitStore {
    /// Insert a habit, ignoring `habit.id`, and return the new id.
    fn insert_habit(&self, habit: &Habit) -> Result<i64>;

    fn load_habit(&self, habit_id: i64) -> Result<Option<Habit>>;

    /// Overwrite the stored row. Fails with not-found if the habit is gone.
    fn save_habit(&self, habit: &Habit) -> Result<()>;

    /// Overwrite only the stored streak. Fails with not-found if the habit is gone.
    fn save_streak(&self, habit_id: i64, streak: u32) -> Result<()>;

    /// Remove the habit and every log entry that belongs to it.
    fn delete_habit(&self, habit_id: i64) -> Result<()>;

    /// Append the "deleted" entry and remove the habit with its ledger as one
    /// transaction. Nothing is written when the removal fails.
    fn delete_habit_logged(&self, habit_id: i64, at: DateTime<Utc>) -> Result<()>;

    fn habits_for_user(&self, user_id: i64) -> Result<Vec<Habit>>;

    fn append_log(
        &self,
        habit_id: i64,
        outcome: Outcome,
        note: &LogNote,
        at: DateTime<Utc>,
    ) -> Result<i64>;

    fn most_recent_log(&self, habit_id: i64, notes: &[LogNote]) -> Result<Option<LogEntry>>;

    fn count_logs(&self, habit_id: i64, filter: &LogFilter) -> Result<u64>;

    fn ledger(&self, habit_id: i64) -> Result<Ledger>;
}

impl<T: HabitStore + ?Sized> HabitStore for &T {
    fn insert_habit(&self, habit: &Habit) -> Result<i64> {
        (**self).insert_habit(habit)
    }

    fn load_habit(&self, habit_id: i64) -> Result<Option<Habit>> {
        (**self).load_habit(habit_id)
    }

    fn save_habit(&self, habit: &Habit) -> Result<()> {
        (**self).save_habit(habit)
    }

    fn save_streak(&self, habit_id: i64, streak: u32) -> Result<()> {
        (**self).save_streak(habit_id, streak)
    }

    fn delete_habit(&self, habit_id: i64) -> Result<()> {
        (**self).delete_habit(habit_id)
    }

    fn delete_habit_logged(&self, habit_id: i64, at: DateTime<Utc>) -> Result<()> {
        (**self).delete_habit_logged(habit_id, at)
    }

    fn habits_for_user(&self, user_id: i64) -> Result<Vec<Habit>> {
        (**self).habits_for_user(user_id)
    }

    fn append_log(
        &self,
        habit_id: i64,
        outcome: Outcome,
        note: &LogNote,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        (**self).append_log(habit_id, outcome, note, at)
    }

    fn most_recent_log(&self, habit_id: i64, notes: &[LogNote]) -> Result<Option<LogEntry>> {
        (**self).most_recent_log(habit_id, notes)
    }

    fn count_logs(&self, habit_id: i64, filter: &LogFilter) -> Result<u64> {
        (**self).count_logs(habit_id, filter)
    }

    fn ledger(&self, habit_id: i64) -> Result<Ledger> {
        (**self).ledger(habit_id)
    }
}
