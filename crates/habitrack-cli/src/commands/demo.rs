use clap::Subcommand;
use habitrack_core::demo::seed_demo;
use habitrack_core::Database;

use super::{print_json, CmdResult};

#[derive(Subcommand)]
pub enum DemoAction {
    /// Create the demo user and five habits with four weeks of history
    Seed,
}

pub fn run(action: DemoAction) -> CmdResult {
    match action {
        DemoAction::Seed => {
            let db = Database::open()?;
            let summary = seed_demo(&db)?;
            print_json(&summary)?;
        }
    }
    Ok(())
}
