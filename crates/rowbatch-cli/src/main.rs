//! rowbatch CLI
//!
//! Inspect flush plans for snapshot pairs and replay edit scripts through a
//! coordinator.

use clap::{Parser, Subcommand, ValueEnum};
use rowbatch_core::logging_facility::{init, Profile};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "rowbatch")]
#[command(
    about = "rowbatch - batched structural updates for sectioned collections",
    long_about = None
)]
struct Cli {
    /// Log output on stderr
    #[arg(long, value_enum, global = true, default_value_t = LogMode::Off)]
    log: LogMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogMode {
    Off,
    Dev,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Diff two JSON snapshots and print the flush plan
    Diff(commands::diff::DiffArgs),
    /// Run a JSON edit script through an imperative coordinator
    Replay(commands::replay::ReplayArgs),
}

fn main() {
    let cli = Cli::parse();

    match cli.log {
        LogMode::Off => {}
        LogMode::Dev => init(Profile::Development),
        LogMode::Json => init(Profile::Production),
    }

    let result = match cli.command {
        Commands::Diff(args) => commands::diff::execute(args),
        Commands::Replay(args) => commands::replay::execute(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
