//! User accounts.
//!
//! A user only matters to the habit engine as the owner key of its habits.
//! Passwords are stored as hex-encoded SHA-256 digests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::storage::Database;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn check_password(&self, password: &str) -> bool {
        self.password_hash == hash_password(password)
    }
}

pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field }.into());
    }
    Ok(())
}

/// Account operations over the user table.
pub struct Accounts<'a, C: Clock> {
    db: &'a Database,
    clock: C,
}

impl<'a, C: Clock> Accounts<'a, C> {
    pub fn new(db: &'a Database, clock: C) -> Self {
        Self { db, clock }
    }

    /// Create an account. A taken username is an integrity error.
    pub fn register(&self, username: &str, password: &str) -> Result<User> {
        required("username", username)?;
        required("password", password)?;
        let username = username.trim();
        let created_at = self.clock.now();
        let password_hash = hash_password(password);
        let id = self.db.create_user(username, &password_hash, created_at)?;
        tracing::info!(user_id = id, username, "registered user");
        Ok(User {
            id,
            username: username.to_string(),
            password_hash,
            created_at,
            last_login: None,
        })
    }

    pub fn find(&self, username: &str) -> Result<User> {
        self.db
            .user_by_username(username)?
            .ok_or_else(|| CoreError::user_not_found(username))
    }

    /// Verify credentials and stamp `last_login`.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let Some(mut user) = self.db.user_by_username(username)? else {
            return Err(CoreError::Authentication(format!("unknown user '{username}'")));
        };
        if !user.check_password(password) {
            tracing::warn!(username, "rejected login with wrong password");
            return Err(CoreError::Authentication("wrong password".into()));
        }
        let now = self.clock.now();
        self.db.touch_last_login(user.id, now)?;
        user.last_login = Some(now);
        Ok(user)
    }

    /// Change username and/or password.
    pub fn update_profile(
        &self,
        user: &mut User,
        username: Option<&str>,
        password: Option<&str>,
    ) -> Result<()> {
        if let Some(name) = username {
            required("username", name)?;
        }
        if let Some(pw) = password {
            required("password", pw)?;
        }
        let username = username.map(str::trim);
        let password_hash = password.map(hash_password);
        self.db
            .update_user(user.id, username, password_hash.as_deref())?;
        if let Some(name) = username {
            user.username = name.to_string();
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        tracing::info!(user_id = user.id, "updated profile");
        Ok(())
    }

    /// Set a new password for `username` without the old one.
    pub fn reset_password(&self, username: &str, new_password: &str) -> Result<User> {
        let mut user = self.find(username)?;
        self.update_profile(&mut user, None, Some(new_password))?;
        Ok(user)
    }

    /// Remove the account, its habits and their ledgers.
    pub fn delete_account(&self, user: User) -> Result<()> {
        self.db.delete_user(user.id)?;
        tracing::info!(user_id = user.id, username = %user.username, "deleted account");
        Ok(())
    }
}
