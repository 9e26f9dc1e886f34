//! Demo data.
//!
//! Seeds one account with five habits and four weeks of history so the
//! analytics commands have something to chew on. Every entry is stamped by a
//! [`ManualClock`] walked forward from a fixed start, so the seeded ledgers
//! are identical on every run.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::clock::ManualClock;
use crate::error::{CoreError, Result};
use crate::habit::{Habit, HabitDraft, HabitTracker, LogNote, Outcome, Periodicity};
use crate::storage::Database;
use crate::user::{Accounts, User};

pub const DEMO_USERNAME: &str = "user123";
pub const DEMO_PASSWORD: &str = "password123";

/// Gap between the creation times of consecutive demo habits.
const STAGGER_MINUTES: i64 = 30;

#[derive(Debug, Clone, Copy)]
enum Check {
    Done,
    Miss,
}

impl Check {
    fn entry(self) -> (Outcome, LogNote) {
        match self {
            Check::Done => (Outcome::Success, LogNote::Completed),
            Check::Miss => (Outcome::Failure, LogNote::MarkedIncomplete),
        }
    }
}

struct DemoHabit {
    name: &'static str,
    description: &'static str,
    periodicity: Periodicity,
    duration: u32,
    /// One check per period, starting at creation time.
    checks: Vec<Check>,
}

fn demo_habits() -> Vec<DemoHabit> {
    use Check::{Done, Miss};

    let reading = std::iter::repeat(Done)
        .take(14)
        .chain(std::iter::repeat(Miss).take(14))
        .collect();

    vec![
        DemoHabit {
            name: "Grocery Shopping",
            description: "Buy groceries for the week",
            periodicity: Periodicity::Weekly,
            duration: 4,
            checks: vec![Done, Done, Done, Miss],
        },
        DemoHabit {
            name: "Attend a Fitness Class",
            description: "Go to a group workout",
            periodicity: Periodicity::Weekly,
            duration: 4,
            checks: vec![Done, Done, Done, Miss],
        },
        DemoHabit {
            name: "Practice a Hobby",
            description: "Spend an evening on a hobby",
            periodicity: Periodicity::Weekly,
            duration: 4,
            checks: vec![Miss; 4],
        },
        DemoHabit {
            name: "Write in a journal",
            description: "Write a short journal entry",
            periodicity: Periodicity::Daily,
            duration: 28,
            checks: vec![Done; 28],
        },
        DemoHabit {
            name: "Read for 20 minutes",
            description: "Read a book before bed",
            periodicity: Periodicity::Daily,
            duration: 28,
            checks: reading,
        },
    ]
}

/// 2024-06-20T15:30:00Z
const REGISTERED_AT_SECS: i64 = 1_718_897_400;
/// 2024-06-23T16:30:00Z
const FIRST_HABIT_AT_SECS: i64 = 1_719_160_200;

fn instant(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CoreError::Custom(format!("timestamp {secs} is out of range")))
}

/// What [`seed_demo`] created.
#[derive(Debug, Clone, Serialize)]
pub struct DemoSummary {
    pub user: User,
    pub habits: Vec<Habit>,
    pub log_entries: usize,
}

/// Create the demo account and its habits.
///
/// # Errors
/// Refuses when the demo user already exists, so seeding twice never
/// doubles the history.
pub fn seed_demo(db: &Database) -> Result<DemoSummary> {
    if db.user_by_username(DEMO_USERNAME)?.is_some() {
        return Err(CoreError::Custom(format!(
            "demo user '{DEMO_USERNAME}' already exists"
        )));
    }

    let clock = ManualClock::new(instant(REGISTERED_AT_SECS)?);
    let user = Accounts::new(db, &clock).register(DEMO_USERNAME, DEMO_PASSWORD)?;
    let tracker = HabitTracker::new(db, &clock);

    let mut habits = Vec::new();
    let mut log_entries = 0;
    let mut created_at = instant(FIRST_HABIT_AT_SECS)?;
    for spec in demo_habits() {
        clock.set(created_at);
        let draft = HabitDraft::new(
            spec.name,
            spec.description,
            spec.periodicity.clone(),
            i64::from(spec.duration),
        );
        let mut habit = tracker.create_habit(user.id, &draft)?;
        log_entries += 1;

        let period = match spec.periodicity {
            Periodicity::Weekly => Duration::weeks(1),
            _ => Duration::days(1),
        };
        for (i, check) in spec.checks.iter().enumerate() {
            clock.set(created_at + period * i as i32);
            let (outcome, note) = check.entry();
            tracker.record_entry(&habit, outcome, note)?;
            log_entries += 1;
        }
        tracker.current_streak(&mut habit)?;
        tracing::debug!(habit_id = habit.id, name = %habit.name, streak = habit.streak, "seeded habit");

        habits.push(habit);
        created_at += Duration::minutes(STAGGER_MINUTES);
    }

    tracing::info!(
        user_id = user.id,
        habits = habits.len(),
        log_entries,
        "seeded demo data"
    );
    Ok(DemoSummary {
        user,
        habits,
        log_entries,
    })
}
