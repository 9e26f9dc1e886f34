use clap::Subcommand;
use habitrack_core::{Accounts, Database, SystemClock};

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum UserAction {
    /// Create an account
    Register {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Check credentials and record the login
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Change username and/or password
    Update {
        username: String,
        /// Current password
        #[arg(long)]
        password: String,
        #[arg(long)]
        new_username: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
    },
    /// Set a new password without the old one
    ResetPassword {
        username: String,
        #[arg(long)]
        new_password: String,
    },
    /// Delete the account with all its habits and logs
    Delete {
        username: String,
        #[arg(long)]
        password: String,
    },
}

pub fn run(action: UserAction) -> CmdResult {
    let db = Database::open()?;
    let accounts = Accounts::new(&db, SystemClock);

    match action {
        UserAction::Register { username, password } => {
            let user = accounts.register(&username, &password)?;
            print_json(&user)?;
        }
        UserAction::Login { username, password } => {
            let user = accounts.authenticate(&username, &password)?;
            print_json(&user)?;
        }
        UserAction::Update {
            username,
            password,
            new_username,
            new_password,
        } => {
            if new_username.is_none() && new_password.is_none() {
                return Err("nothing to update: pass --new-username and/or --new-password".into());
            }
            let mut user = accounts.authenticate(&username, &password)?;
            accounts.update_profile(&mut user, new_username.as_deref(), new_password.as_deref())?;
            print_json(&user)?;
        }
        UserAction::ResetPassword {
            username,
            new_password,
        } => {
            let user = accounts.reset_password(&username, &new_password)?;
            print_json(&user)?;
        }
        UserAction::Delete { username, password } => {
            let user = accounts.authenticate(&username, &password)?;
            accounts.delete_account(user)?;
            print_json(&serde_json::json!({ "deleted": username }))?;
        }
    }
    Ok(())
}
