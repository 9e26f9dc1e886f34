use clap::Subcommand;
use habitrack_core::{
    Clock, Config, Habit, HabitChanges, HabitDraft, HabitState, Outcome, Periodicity,
};
use serde::Serialize;

use super::{find_user, open_tracker, owned_habit, print_json, CmdResult};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Create {
        /// Owner username
        #[arg(long)]
        user: String,
        name: String,
        #[arg(long)]
        description: String,
        /// daily or weekly (default from config)
        #[arg(long)]
        periodicity: Option<String>,
        /// Number of periods until the deadline (default from config)
        #[arg(long)]
        duration: Option<i64>,
    },
    /// List a user's habits
    List {
        #[arg(long)]
        user: String,
    },
    /// Show one habit
    Show {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Change a habit and restart it
    Update {
        #[arg(long)]
        user: String,
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        periodicity: Option<String>,
        #[arg(long)]
        duration: Option<i64>,
    },
    /// Delete a habit and its history
    Delete {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Run a status check (complete, or mark incomplete when overdue)
    Check {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Deactivate a habit whose deadline has passed
    Deactivate {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Recompute and show the streak
    Streak {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Append a free-form ledger entry; status texts are refused
    Log {
        #[arg(long)]
        user: String,
        id: i64,
        #[arg(long)]
        note: String,
        /// Record the entry as a failure
        #[arg(long)]
        failure: bool,
    },
    /// Show the ledger
    History {
        #[arg(long)]
        user: String,
        id: i64,
    },
}

#[derive(Serialize)]
struct HabitView<'a> {
    #[serde(flatten)]
    habit: &'a Habit,
    state: HabitState,
    #[serde(skip_serializing_if = "Option::is_none")]
    can_mark_complete: Option<bool>,
}

fn parse_periodicity(raw: Option<String>) -> Result<Option<Periodicity>, habitrack_core::CoreError> {
    raw.map(|p| p.parse::<Periodicity>().map_err(Into::into))
        .transpose()
}

pub fn run(action: HabitAction) -> CmdResult {
    let tracker = open_tracker()?;
    let db = tracker.store();
    let now = tracker.clock().now();

    match action {
        HabitAction::Create {
            user,
            name,
            description,
            periodicity,
            duration,
        } => {
            let owner = find_user(db, &user)?;
            let config = Config::load()?;
            let periodicity = match parse_periodicity(periodicity)? {
                Some(p) => p,
                None => config.default_periodicity()?,
            };
            let duration = duration.unwrap_or_else(|| i64::from(config.defaults.duration));
            let draft = HabitDraft::new(name, description, periodicity, duration);
            let habit = tracker.create_habit(owner.id, &draft)?;
            print_json(&HabitView {
                state: habit.state(now),
                habit: &habit,
                can_mark_complete: None,
            })?;
        }
        HabitAction::List { user } => {
            let owner = find_user(db, &user)?;
            let habits = tracker.habits_for_user(owner.id)?;
            let views: Vec<_> = habits
                .iter()
                .map(|habit| HabitView {
                    habit,
                    state: habit.state(now),
                    can_mark_complete: None,
                })
                .collect();
            print_json(&views)?;
        }
        HabitAction::Show { user, id } => {
            let owner = find_user(db, &user)?;
            let habit = owned_habit(&tracker, &owner, id)?;
            print_json(&HabitView {
                state: habit.state(now),
                can_mark_complete: Some(tracker.can_mark_complete(&habit)?),
                habit: &habit,
            })?;
        }
        HabitAction::Update {
            user,
            id,
            name,
            description,
            periodicity,
            duration,
        } => {
            let owner = find_user(db, &user)?;
            let mut habit = owned_habit(&tracker, &owner, id)?;
            let changes = HabitChanges {
                name,
                description,
                periodicity: parse_periodicity(periodicity)?,
                duration,
            };
            tracker.update_habit(&mut habit, &changes)?;
            print_json(&HabitView {
                state: habit.state(now),
                habit: &habit,
                can_mark_complete: None,
            })?;
        }
        HabitAction::Delete { user, id } => {
            let owner = find_user(db, &user)?;
            let habit = owned_habit(&tracker, &owner, id)?;
            tracker.delete_habit(habit)?;
            print_json(&serde_json::json!({ "deleted": id }))?;
        }
        HabitAction::Check { user, id } => {
            let owner = find_user(db, &user)?;
            let mut habit = owned_habit(&tracker, &owner, id)?;
            let outcome = tracker.update_status(&mut habit)?;
            print_json(&serde_json::json!({
                "habit_id": id,
                "outcome": outcome,
                "streak": habit.streak,
            }))?;
        }
        HabitAction::Deactivate { user, id } => {
            let owner = find_user(db, &user)?;
            let mut habit = owned_habit(&tracker, &owner, id)?;
            let outcome = tracker.deactivate(&mut habit)?;
            print_json(&serde_json::json!({
                "habit_id": id,
                "outcome": outcome,
                "active": habit.active,
            }))?;
        }
        HabitAction::Streak { user, id } => {
            let owner = find_user(db, &user)?;
            let mut habit = owned_habit(&tracker, &owner, id)?;
            let streak = tracker.current_streak(&mut habit)?;
            print_json(&serde_json::json!({ "habit_id": id, "streak": streak }))?;
        }
        HabitAction::Log {
            user,
            id,
            note,
            failure,
        } => {
            let owner = find_user(db, &user)?;
            let habit = owned_habit(&tracker, &owner, id)?;
            let outcome = if failure {
                Outcome::Failure
            } else {
                Outcome::Success
            };
            let entry = tracker.add_note(&habit, outcome, &note)?;
            print_json(&entry)?;
        }
        HabitAction::History { user, id } => {
            let owner = find_user(db, &user)?;
            let habit = owned_habit(&tracker, &owner, id)?;
            print_json(&tracker.ledger(&habit)?)?;
        }
    }
    Ok(())
}
