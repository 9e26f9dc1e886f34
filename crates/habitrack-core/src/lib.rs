//! # Habitrack Core Library
//!
//! Core logic for the habitrack habit tracker. Every operation is available
//! through the standalone `habitrack` CLI, which is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Habit engine**: deadline calculation, the completion gate, the streak
//!   projection and the status/deactivation transitions. All of it is
//!   caller-driven; nothing runs in the background.
//! - **Ledger**: an append-only log per habit. The stored streak is only ever
//!   a cache of a projection over it.
//! - **Storage**: SQLite persistence with versioned migrations and TOML-based
//!   configuration.
//! - **Analytics**: read-only aggregate queries.
//!
//! ## Key Components
//!
//! - [`HabitTracker`]: lifecycle operations over a [`HabitStore`] and a [`Clock`]
//! - [`Database`]: SQLite-backed store for users, habits and logs
//! - [`Config`]: application configuration management
//! - [`Accounts`]: registration and login

pub mod analytics;
pub mod clock;
pub mod demo;
pub mod error;
pub mod habit;
pub mod storage;
pub mod user;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use habit::{
    DeactivationOutcome, Habit, HabitChanges, HabitDraft, HabitState, HabitTracker, Ledger,
    LogEntry, LogFilter, LogNote, Outcome, Periodicity, StatusOutcome,
};
pub use storage::{Config, Database, HabitStore};
pub use user::{Accounts, User};
