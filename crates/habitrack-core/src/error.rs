//! Core error types for habitrack-core.
//!
//! Validation failures, missing records and store integrity problems are
//! errors. Business no-ops (not due yet, already inactive, cooldown still
//! running) are reported through outcome enums instead and never show up
//! here.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitrack-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors, raised before any state is touched
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The referenced record does not exist (or is not visible to the caller)
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Wrong credentials or unknown account
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

impl CoreError {
    pub fn habit_not_found(id: i64) -> Self {
        CoreError::NotFound {
            entity: "habit",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(username: &str) -> Self {
        CoreError::NotFound {
            entity: "user",
            id: username.to_string(),
        }
    }
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Unique / foreign key / not-null constraint rejected the write
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse a configuration value
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty or whitespace
    #[error("'{field}' must not be empty")]
    EmptyField { field: &'static str },

    /// Duration must be a positive number of periods
    #[error("duration must be a positive number of periods, got {0}")]
    NonPositiveDuration(i64),

    /// Periodicity is neither daily nor weekly
    #[error("unknown periodicity '{0}' (expected 'daily' or 'weekly')")]
    UnknownPeriodicity(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                rusqlite::ErrorCode::ConstraintViolation => DatabaseError::ConstraintViolation(
                    msg.clone().unwrap_or_else(|| code.to_string()),
                ),
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(DatabaseError::from(err))
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
