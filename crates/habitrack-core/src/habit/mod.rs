//! Habit records and the lifecycle engine around them.
//!
//! A habit carries a cadence ([`Periodicity`] plus a duration in periods),
//! a deadline derived from an anchor instant, an `active` flag and a streak.
//! Everything else about its history lives in the append-only [`Ledger`].
//!
//! ```text
//!   create / update ──> ActivePending ──(now > deadline)──> ActiveOverdue
//!                            ^                                   |
//!                            |           deactivate              v
//!                            +────── update ───────────────── Inactive
//! ```

pub mod deadline;
pub mod eligibility;
pub mod ledger;
pub mod streak;
pub mod tracker;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub use deadline::calculate_deadline;
pub use eligibility::{can_mark_complete, DAILY_COOLDOWN_SECS, WEEKLY_COOLDOWN_SECS};
pub use ledger::{Ledger, LogEntry, LogFilter, LogNote, Outcome};
pub use streak::{calculate_streak, StreakProjection};
pub use tracker::{DeactivationOutcome, HabitTracker, StatusOutcome};

/// Cadence unit of a habit.
///
/// User input only ever produces `Daily` or `Weekly`; `Other` exists so that
/// rows written by older tools with an unexpected value still load. Such
/// habits get a degenerate deadline and an always-open eligibility gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Periodicity {
    Daily,
    Weekly,
    Other(String),
}

impl Periodicity {
    pub fn as_str(&self) -> &str {
        match self {
            Periodicity::Daily => "daily",
            Periodicity::Weekly => "weekly",
            Periodicity::Other(raw) => raw,
        }
    }

    /// Lenient mapping used when reading stored rows.
    pub fn from_stored(raw: &str) -> Self {
        raw.parse()
            .unwrap_or_else(|_| Periodicity::Other(raw.to_string()))
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Periodicity::Other(_))
    }
}

impl FromStr for Periodicity {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Periodicity::Daily),
            "weekly" => Ok(Periodicity::Weekly),
            _ => Err(ValidationError::UnknownPeriodicity(s.to_string())),
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Periodicity {
    fn from(raw: String) -> Self {
        Periodicity::from_stored(&raw)
    }
}

impl From<Periodicity> for String {
    fn from(p: Periodicity) -> Self {
        p.as_str().to_string()
    }
}

/// Lifecycle position of a habit at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitState {
    /// Active and the deadline has not passed yet
    ActivePending,
    /// Active but the deadline is behind us; every check marks it incomplete
    ActiveOverdue,
    /// Deactivated; checks are refused
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: String,
    pub periodicity: Periodicity,
    pub duration: u32,
    pub active: bool,
    pub deadline: DateTime<Utc>,
    pub streak: u32,
    pub created_at: DateTime<Utc>,
}

impl Habit {
    pub fn state(&self, now: DateTime<Utc>) -> HabitState {
        if !self.active {
            HabitState::Inactive
        } else if now > self.deadline {
            HabitState::ActiveOverdue
        } else {
            HabitState::ActivePending
        }
    }
}

/// Input for creating a habit.
#[derive(Debug, Clone)]
pub struct HabitDraft {
    pub name: String,
    pub description: String,
    pub periodicity: Periodicity,
    pub duration: i64,
}

/// Cadence and text that passed validation.
#[derive(Debug, Clone)]
pub(crate) struct ValidDraft {
    pub name: String,
    pub description: String,
    pub periodicity: Periodicity,
    pub duration: u32,
}

impl HabitDraft {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        periodicity: Periodicity,
        duration: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            periodicity,
            duration,
        }
    }

    pub(crate) fn validate(&self) -> Result<ValidDraft, ValidationError> {
        Ok(ValidDraft {
            name: non_empty("name", &self.name)?,
            description: non_empty("description", &self.description)?,
            periodicity: recognized(&self.periodicity)?,
            duration: positive_duration(self.duration)?,
        })
    }
}

/// Partial update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct HabitChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub periodicity: Option<Periodicity>,
    pub duration: Option<i64>,
}

impl HabitChanges {
    /// Apply onto a copy of `habit`, validating every provided field first.
    pub(crate) fn apply_to(&self, habit: &Habit) -> Result<Habit, ValidationError> {
        let mut next = habit.clone();
        if let Some(name) = &self.name {
            next.name = non_empty("name", name)?;
        }
        if let Some(description) = &self.description {
            next.description = non_empty("description", description)?;
        }
        if let Some(periodicity) = &self.periodicity {
            next.periodicity = recognized(periodicity)?;
        }
        if let Some(duration) = self.duration {
            next.duration = positive_duration(duration)?;
        }
        Ok(next)
    }
}

fn non_empty(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

fn recognized(periodicity: &Periodicity) -> Result<Periodicity, ValidationError> {
    match periodicity {
        Periodicity::Other(raw) => Err(ValidationError::UnknownPeriodicity(raw.clone())),
        known => Ok(known.clone()),
    }
}

fn positive_duration(duration: i64) -> Result<u32, ValidationError> {
    if duration <= 0 {
        return Err(ValidationError::NonPositiveDuration(duration));
    }
    u32::try_from(duration).map_err(|_| ValidationError::InvalidValue {
        field: "duration".into(),
        message: format!("{duration} periods is out of range"),
    })
}
