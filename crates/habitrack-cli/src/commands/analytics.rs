use clap::Subcommand;
use habitrack_core::analytics;
use habitrack_core::Periodicity;

use super::{find_user, open_tracker, owned_habit, print_json, CmdResult};

#[derive(Subcommand)]
pub enum AnalyticsAction {
    /// Active habits
    Active {
        #[arg(long)]
        user: String,
    },
    /// Habits with the given periodicity
    Periodicity {
        #[arg(long)]
        user: String,
        periodicity: String,
    },
    /// Habit with the highest streak
    LongestStreak {
        #[arg(long)]
        user: String,
    },
    /// Stored streak of one habit
    Streak {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Completed checks as a percentage of all checks
    CompletionRate {
        #[arg(long)]
        user: String,
        id: i64,
    },
    /// Summary of a habit's log
    Analyze {
        #[arg(long)]
        user: String,
        id: i64,
    },
}

pub fn run(action: AnalyticsAction) -> CmdResult {
    let tracker = open_tracker()?;
    let db = tracker.store();

    match action {
        AnalyticsAction::Active { user } => {
            let owner = find_user(db, &user)?;
            print_json(&analytics::active_habits(db, owner.id)?)?;
        }
        AnalyticsAction::Periodicity { user, periodicity } => {
            let owner = find_user(db, &user)?;
            let periodicity: Periodicity = periodicity.parse()?;
            print_json(&analytics::habits_by_periodicity(db, owner.id, &periodicity)?)?;
        }
        AnalyticsAction::LongestStreak { user } => {
            let owner = find_user(db, &user)?;
            print_json(&analytics::longest_streak(db, owner.id)?)?;
        }
        AnalyticsAction::Streak { user, id } => {
            let owner = find_user(db, &user)?;
            owned_habit(&tracker, &owner, id)?;
            let streak = analytics::streak_for_habit(db, id)?;
            print_json(&serde_json::json!({ "habit_id": id, "streak": streak }))?;
        }
        AnalyticsAction::CompletionRate { user, id } => {
            let owner = find_user(db, &user)?;
            owned_habit(&tracker, &owner, id)?;
            let rate = analytics::completion_rate(db, id)?;
            print_json(&serde_json::json!({ "habit_id": id, "completion_rate": rate }))?;
        }
        AnalyticsAction::Analyze { user, id } => {
            let owner = find_user(db, &user)?;
            owned_habit(&tracker, &owner, id)?;
            print_json(&analytics::analyze_logs(db, id)?)?;
        }
    }
    Ok(())
}
