use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "cardbox-cli", version, about = "Cardbox CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session lifecycle and schema operations
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Application configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Scheduler version and V3 flag
    Scheduler {
        #[command(subcommand)]
        action: commands::scheduler::SchedulerAction,
    },
    /// Timebox control
    Timebox {
        #[command(subcommand)]
        action: commands::timebox::TimeboxAction,
    },
    /// Undo/redo (history is per-session; it does not span invocations)
    Undo {
        #[command(subcommand)]
        action: commands::undo::UndoAction,
    },
    /// Record answered cards
    Answer {
        /// Number of answers to record
        #[arg(default_value_t = 1)]
        count: u64,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Session { action } => commands::session::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Scheduler { action } => commands::scheduler::run(action),
        Commands::Timebox { action } => commands::timebox::run(action),
        Commands::Undo { action } => commands::undo::run(action),
        Commands::Answer { count } => commands::answer::run(count),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
