//! Habit lifecycle operations.
//!
//! [`HabitTracker`] ties the pure pieces (deadline, eligibility gate, streak
//! projection) to a [`HabitStore`] and a [`Clock`]. Every transition happens
//! only when a caller invokes it; nothing here runs on a timer.
//!
//! ## Status check
//!
//! ```text
//! inactive            -> "update failed - habit inactive"   (Inactive)
//! now > deadline      -> "marked as incomplete" + re-project (MarkedIncomplete)
//! gate open           -> "completed successfully on time" + re-project (Completed)
//! otherwise           -> no write                            (NotYetDue)
//! ```
//!
//! The deadline is not advanced by a status check. An overdue habit stays
//! overdue until it is updated or deactivated.

use serde::{Deserialize, Serialize};

use super::deadline::calculate_deadline;
use super::eligibility::can_mark_complete;
use super::ledger::QUALIFYING_NOTES;
use super::streak::{calculate_streak, StreakProjection};
use super::{Habit, HabitChanges, HabitDraft, Ledger, LogEntry, LogNote, Outcome};
use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::HabitStore;

/// Result of [`HabitTracker::update_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusOutcome {
    Completed,
    MarkedIncomplete,
    Inactive,
    /// The cooldown since the last check has not elapsed; nothing was written.
    NotYetDue,
}

/// Result of [`HabitTracker::deactivate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationOutcome {
    Deactivated,
    NotDue,
    AlreadyInactive,
}

pub struct HabitTracker<S, C> {
    store: S,
    clock: C,
}

impl<S: HabitStore, C: Clock> HabitTracker<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn require(&self, habit_id: i64) -> Result<Habit> {
        self.store
            .load_habit(habit_id)?
            .ok_or_else(|| CoreError::habit_not_found(habit_id))
    }

    fn append(&self, habit_id: i64, outcome: Outcome, note: LogNote) -> Result<LogEntry> {
        let timestamp = self.clock.now();
        let id = self.store.append_log(habit_id, outcome, &note, timestamp)?;
        Ok(LogEntry {
            id,
            habit_id,
            timestamp,
            outcome,
            note,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn load_habit(&self, habit_id: i64) -> Result<Habit> {
        self.require(habit_id)
    }

    pub fn habits_for_user(&self, user_id: i64) -> Result<Vec<Habit>> {
        self.store.habits_for_user(user_id)
    }

    pub fn ledger(&self, habit: &Habit) -> Result<Ledger> {
        self.store.ledger(habit.id)
    }

    /// Whether a check right now would record a completion.
    pub fn can_mark_complete(&self, habit: &Habit) -> Result<bool> {
        let last = self.store.most_recent_log(habit.id, &QUALIFYING_NOTES)?;
        Ok(can_mark_complete(habit, last.as_ref(), self.clock.now()))
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create an active habit anchored at the current instant.
    pub fn create_habit(&self, owner: i64, draft: &HabitDraft) -> Result<Habit> {
        let valid = draft.validate()?;
        let now = self.clock.now();
        let mut habit = Habit {
            id: 0,
            user_id: owner,
            deadline: calculate_deadline(&valid.periodicity, valid.duration, now),
            name: valid.name,
            description: valid.description,
            periodicity: valid.periodicity,
            duration: valid.duration,
            active: true,
            streak: 0,
            created_at: now,
        };
        habit.id = self.store.insert_habit(&habit)?;
        self.append(habit.id, Outcome::Success, LogNote::Created)?;
        tracing::info!(
            habit_id = habit.id,
            user_id = owner,
            periodicity = %habit.periodicity,
            deadline = %habit.deadline,
            "created habit"
        );
        Ok(habit)
    }

    /// Apply `changes`, re-anchor the deadline at now and re-activate.
    ///
    /// Changes are applied onto the stored habit, not the caller's copy.
    pub fn update_habit(&self, habit: &mut Habit, changes: &HabitChanges) -> Result<()> {
        let stored = self.require(habit.id)?;
        let mut next = changes.apply_to(&stored)?;
        let now = self.clock.now();
        next.deadline = calculate_deadline(&next.periodicity, next.duration, now);
        next.active = true;
        self.store.save_habit(&next)?;
        self.append(next.id, Outcome::Success, LogNote::Restarted)?;
        tracing::info!(habit_id = next.id, deadline = %next.deadline, "restarted habit");
        *habit = next;
        Ok(())
    }

    /// Remove the habit and its ledger. The deletion entry is written in the
    /// same store transaction, so a failed delete leaves the ledger as it was.
    pub fn delete_habit(&self, habit: Habit) -> Result<()> {
        self.require(habit.id)?;
        self.store.delete_habit_logged(habit.id, self.clock.now())?;
        tracing::info!(habit_id = habit.id, "deleted habit");
        Ok(())
    }

    /// Run one status check.
    ///
    /// Decisions are taken on the stored habit; `habit` is refreshed from it.
    pub fn update_status(&self, habit: &mut Habit) -> Result<StatusOutcome> {
        *habit = self.require(habit.id)?;

        if !habit.active {
            self.append(habit.id, Outcome::Failure, LogNote::UpdateFailedInactive)?;
            tracing::info!(habit_id = habit.id, "status check refused, habit inactive");
            return Ok(StatusOutcome::Inactive);
        }

        let now = self.clock.now();
        if now > habit.deadline {
            self.append(habit.id, Outcome::Failure, LogNote::MarkedIncomplete)?;
            let projection = self.refresh_streak(habit)?;
            tracing::info!(
                habit_id = habit.id,
                streak = projection.streak,
                "deadline passed, marked incomplete"
            );
            return Ok(StatusOutcome::MarkedIncomplete);
        }

        if self.can_mark_complete(habit)? {
            self.append(habit.id, Outcome::Success, LogNote::Completed)?;
            let projection = self.refresh_streak(habit)?;
            tracing::info!(habit_id = habit.id, streak = projection.streak, "completed on time");
            Ok(StatusOutcome::Completed)
        } else {
            tracing::debug!(habit_id = habit.id, "cooldown still running");
            Ok(StatusOutcome::NotYetDue)
        }
    }

    /// Deactivate a habit whose deadline is strictly in the past.
    pub fn deactivate(&self, habit: &mut Habit) -> Result<DeactivationOutcome> {
        *habit = self.require(habit.id)?;

        if !habit.active {
            return Ok(DeactivationOutcome::AlreadyInactive);
        }
        if habit.deadline >= self.clock.now() {
            return Ok(DeactivationOutcome::NotDue);
        }

        let mut next = habit.clone();
        next.active = false;
        self.store.save_habit(&next)?;
        self.append(next.id, Outcome::Failure, LogNote::Deactivated)?;
        tracing::info!(habit_id = next.id, deadline = %next.deadline, "deactivated habit");
        *habit = next;
        Ok(DeactivationOutcome::Deactivated)
    }

    /// Re-derive the streak from the ledger and store it.
    pub fn current_streak(&self, habit: &mut Habit) -> Result<u32> {
        *habit = self.require(habit.id)?;
        Ok(self.refresh_streak(habit)?.streak)
    }

    fn refresh_streak(&self, habit: &mut Habit) -> Result<StreakProjection> {
        let projection = calculate_streak(&self.store.ledger(habit.id)?);
        self.store.save_streak(habit.id, projection.streak)?;
        habit.streak = projection.streak;
        tracing::debug!(
            habit_id = habit.id,
            success_count = projection.success_count,
            incomplete_runs = projection.incomplete_runs,
            streak = projection.streak,
            "projected streak"
        );
        Ok(projection)
    }

    /// Attach a free-text note, stamped with the current time.
    ///
    /// Notes are informational only. Text that spells one of the engine's
    /// own notes is rejected, so a note can never pass for a check.
    pub fn add_note(&self, habit: &Habit, outcome: Outcome, text: &str) -> Result<LogEntry> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyField { field: "note" }.into());
        }
        let note = LogNote::parse(text);
        if !matches!(note, LogNote::Custom(_)) {
            return Err(ValidationError::InvalidValue {
                field: "note".into(),
                message: format!("'{text}' is reserved for status changes"),
            }
            .into());
        }
        self.record_entry(habit, outcome, note)
    }

    /// Append any entry, stamped with the current time. Seeding uses this to
    /// replay a history of checks.
    pub(crate) fn record_entry(
        &self,
        habit: &Habit,
        outcome: Outcome,
        note: LogNote,
    ) -> Result<LogEntry> {
        self.require(habit.id)?;
        let entry = self.append(habit.id, outcome, note)?;
        tracing::debug!(habit_id = habit.id, log_id = entry.id, note = %entry.note, "recorded entry");
        Ok(entry)
    }
}
