use clap::{Parser, Subcommand};
use habitrack_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "habitrack", version, about = "Habitrack CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
    /// Habit lifecycle
    Habit {
        #[command(subcommand)]
        action: commands::habit::HabitAction,
    },
    /// Aggregate views over habits and logs
    Analytics {
        #[command(subcommand)]
        action: commands::analytics::AnalyticsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Sample data
    Demo {
        #[command(subcommand)]
        action: commands::demo::DemoAction,
    },
}

/// HABITRACK_LOG, then RUST_LOG, then `logging.level` from config.
fn init_logging() {
    let directive = std::env::var("HABITRACK_LOG")
        .ok()
        .or_else(|| std::env::var("RUST_LOG").ok())
        .or_else(|| Config::load().ok().map(|cfg| cfg.logging.level))
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    tracing::debug!(%directive, "logging initialised");
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::User { action } => commands::user::run(action),
        Commands::Habit { action } => commands::habit::run(action),
        Commands::Analytics { action } => commands::analytics::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Demo { action } => commands::demo::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
