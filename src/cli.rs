//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Community - Keep a GitHub organization in sync with its configuration
#[derive(Parser, Debug)]
#[command(name = "community")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Maintain organization teams
    Team(commands::team::TeamArgs),

    /// Maintain repository workflow files
    Repo(commands::repo::RepoArgs),

    /// Generate activity reports
    Report(commands::report::ReportArgs),

    /// Open a tracking issue in every matching repository
    Track(commands::track::TrackArgs),

    /// Validate repos.toml and teams.toml
    Validate(commands::validate::ValidateArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    fn init_logging(&self) {
        let env = env_logger::Env::default().default_filter_or(self.log_level.as_str());
        // A logger may already be installed when embedded.
        let _ = env_logger::Builder::from_env(env)
            .format_timestamp(None)
            .try_init();
    }

    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        self.init_logging();
        let color = self.color.as_str();

        match self.command {
            Commands::Team(args) => commands::team::execute(args, color),
            Commands::Repo(args) => commands::repo::execute(args, color),
            Commands::Report(args) => commands::report::execute(args, color),
            Commands::Track(args) => commands::track::execute(args, color),
            Commands::Validate(args) => commands::validate::execute(args, color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}
