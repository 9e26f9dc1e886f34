//! SQLite-backed store for users, habits and the log ledger.
//!
//! Rows are mapped into typed records by column name. Timestamps are stored
//! as fixed-width RFC 3339 UTC strings so that text order is time order.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{migrations, Config, HabitStore};
use crate::error::{CoreError, DatabaseError, Result};
use crate::habit::{Habit, Ledger, LogEntry, LogFilter, LogNote, Outcome, Periodicity};
use crate::user::User;

const HABIT_COLUMNS: &str =
    "id, user_id, name, description, periodicity, duration, active, deadline, streak, created_at";
const LOG_COLUMNS: &str = "id, habit_id, log_time, success, note";

pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("bad timestamp in {column}: {e}").into(),
            )
        })
}

fn row_to_habit(row: &Row) -> rusqlite::Result<Habit> {
    let periodicity: String = row.get("periodicity")?;
    let periodicity = Periodicity::from_stored(&periodicity);
    if !periodicity.is_recognized() {
        tracing::warn!(periodicity = %periodicity, "habit row has an unrecognized periodicity");
    }
    let deadline: String = row.get("deadline")?;
    let created_at: String = row.get("created_at")?;
    Ok(Habit {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        periodicity,
        duration: row.get("duration")?,
        active: row.get::<_, i64>("active")? != 0,
        deadline: parse_timestamp(&deadline, "deadline")?,
        streak: row.get("streak")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
    })
}

fn row_to_log(row: &Row) -> rusqlite::Result<LogEntry> {
    let log_time: String = row.get("log_time")?;
    let note: String = row.get("note")?;
    Ok(LogEntry {
        id: row.get("id")?,
        habit_id: row.get("habit_id")?,
        timestamp: parse_timestamp(&log_time, "log_time")?,
        outcome: Outcome::from_flag(row.get("success")?),
        note: LogNote::parse(&note),
    })
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created_at: String = row.get("created_at")?;
    let last_login: Option<String> = row.get("last_login")?;
    Ok(User {
        id: row.get("id")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        created_at: parse_timestamp(&created_at, "created_at")?,
        last_login: last_login
            .map(|raw| parse_timestamp(&raw, "last_login"))
            .transpose()?,
    })
}

/// Delete a habit and its ledger inside the caller's transaction.
fn remove_habit(conn: &Connection, habit_id: i64) -> Result<()> {
    conn.execute("DELETE FROM logs WHERE habit_id = ?1", params![habit_id])?;
    let removed = conn.execute("DELETE FROM habits WHERE id = ?1", params![habit_id])?;
    if removed == 0 {
        return Err(CoreError::habit_not_found(habit_id));
    }
    Ok(())
}

/// SQLite database holding users, habits and log entries.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database file named in the configuration.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = Config::load()?.database_path()?;
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Users ────────────────────────────────────────────────────────

    /// Insert a user. A taken username surfaces as a constraint violation.
    pub fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, format_timestamp(created_at)],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_hash, created_at, last_login
                 FROM users WHERE username = ?1",
                params![username],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn update_user(
        &self,
        user_id: i64,
        username: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET username = COALESCE(?2, username),
                 password_hash = COALESCE(?3, password_hash)
             WHERE id = ?1",
            params![user_id, username, password_hash],
        )?;
        if changed == 0 {
            return Err(CoreError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    pub fn touch_last_login(&self, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        self.conn.execute(
            "UPDATE users SET last_login = ?2 WHERE id = ?1",
            params![user_id, format_timestamp(at)],
        )?;
        Ok(())
    }

    /// Delete a user together with their habits and log entries.
    pub fn delete_user(&self, user_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM logs WHERE habit_id IN (SELECT id FROM habits WHERE user_id = ?1)",
            params![user_id],
        )?;
        tx.execute("DELETE FROM habits WHERE user_id = ?1", params![user_id])?;
        tx.execute("DELETE FROM users WHERE id = ?1", params![user_id])?;
        tx.commit()?;
        Ok(())
    }
}

impl HabitStore for Database {
    fn insert_habit(&self, habit: &Habit) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO habits (user_id, name, description, periodicity, duration, active,
                                 deadline, streak, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                habit.user_id,
                habit.name,
                habit.description,
                habit.periodicity.as_str(),
                habit.duration,
                habit.active,
                format_timestamp(habit.deadline),
                habit.streak,
                format_timestamp(habit.created_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn load_habit(&self, habit_id: i64) -> Result<Option<Habit>> {
        let habit = self
            .conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![habit_id],
                row_to_habit,
            )
            .optional()?;
        Ok(habit)
    }

    fn save_habit(&self, habit: &Habit) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE habits
             SET name = ?2, description = ?3, periodicity = ?4, duration = ?5,
                 active = ?6, deadline = ?7, streak = ?8
             WHERE id = ?1",
            params![
                habit.id,
                habit.name,
                habit.description,
                habit.periodicity.as_str(),
                habit.duration,
                habit.active,
                format_timestamp(habit.deadline),
                habit.streak,
            ],
        )?;
        if changed == 0 {
            return Err(CoreError::habit_not_found(habit.id));
        }
        Ok(())
    }

    fn save_streak(&self, habit_id: i64, streak: u32) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE habits SET streak = ?2 WHERE id = ?1",
            params![habit_id, streak],
        )?;
        if changed == 0 {
            return Err(CoreError::habit_not_found(habit_id));
        }
        Ok(())
    }

    fn delete_habit(&self, habit_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        remove_habit(&tx, habit_id)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_habit_logged(&self, habit_id: i64, at: DateTime<Utc>) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO logs (habit_id, log_time, success, note) VALUES (?1, ?2, ?3, ?4)",
            params![
                habit_id,
                format_timestamp(at),
                Outcome::Failure.as_flag(),
                LogNote::Deleted.as_str()
            ],
        )?;
        remove_habit(&tx, habit_id)?;
        tx.commit()?;
        Ok(())
    }

    fn habits_for_user(&self, user_id: i64) -> Result<Vec<Habit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = ?1 ORDER BY id"
        ))?;
        let habits = stmt
            .query_map(params![user_id], row_to_habit)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(habits)
    }

    fn append_log(
        &self,
        habit_id: i64,
        outcome: Outcome,
        note: &LogNote,
        at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO logs (habit_id, log_time, success, note) VALUES (?1, ?2, ?3, ?4)",
            params![habit_id, format_timestamp(at), outcome.as_flag(), note.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn most_recent_log(&self, habit_id: i64, notes: &[LogNote]) -> Result<Option<LogEntry>> {
        if notes.is_empty() {
            return Ok(None);
        }
        let placeholders = (0..notes.len())
            .map(|i| format!("?{}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {LOG_COLUMNS} FROM logs
             WHERE habit_id = ?1 AND note IN ({placeholders})
             ORDER BY log_time DESC, id DESC
             LIMIT 1"
        );
        let texts: Vec<&str> = notes.iter().map(LogNote::as_str).collect();
        let mut values: Vec<&dyn rusqlite::ToSql> = Vec::with_capacity(notes.len() + 1);
        values.push(&habit_id);
        for text in &texts {
            values.push(text);
        }
        let entry = self
            .conn
            .query_row(&sql, values.as_slice(), row_to_log)
            .optional()?;
        Ok(entry)
    }

    fn count_logs(&self, habit_id: i64, filter: &LogFilter) -> Result<u64> {
        let count: i64 = match filter {
            LogFilter::All => self.conn.query_row(
                "SELECT COUNT(*) FROM logs WHERE habit_id = ?1",
                params![habit_id],
                |row| row.get(0),
            )?,
            LogFilter::Outcome(outcome) => self.conn.query_row(
                "SELECT COUNT(*) FROM logs WHERE habit_id = ?1 AND success = ?2",
                params![habit_id, outcome.as_flag()],
                |row| row.get(0),
            )?,
            LogFilter::Note(note) => self.conn.query_row(
                "SELECT COUNT(*) FROM logs WHERE habit_id = ?1 AND note = ?2",
                params![habit_id, note.as_str()],
                |row| row.get(0),
            )?,
        };
        Ok(count as u64)
    }

    fn ledger(&self, habit_id: i64) -> Result<Ledger> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {LOG_COLUMNS} FROM logs WHERE habit_id = ?1 ORDER BY log_time, id"
        ))?;
        let entries = stmt
            .query_map(params![habit_id], row_to_log)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Ledger::from_entries(entries))
    }
}
