//! # Report Command Implementation
//!
//! `community report weekly` summarizes the last seven days of issue and pull
//! request activity across every live repository and files the result as an
//! issue in the `--output` repository.

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};
use log::info;

use community_sync::activity::{weekly_report, ReportWindow};
use community_sync::github::GithubOperations;
use community_sync::output::{emoji, OutputConfig};
use community_sync::suggestions;

use super::GithubArgs;

/// Generate activity reports
#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(subcommand)]
    pub command: ReportCommand,
}

#[derive(Subcommand, Debug)]
pub enum ReportCommand {
    /// Report the trailing week of activity
    Weekly(WeeklyArgs),
}

#[derive(Args, Debug)]
pub struct WeeklyArgs {
    #[command(flatten)]
    pub github: GithubArgs,

    /// Repository the report issue is opened in
    #[arg(long, value_name = "REPO")]
    pub output: String,

    /// Print the report instead of opening an issue
    #[arg(long, alias = "dry-run")]
    pub print: bool,
}

pub fn execute(args: ReportArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    match args.command {
        ReportCommand::Weekly(args) => weekly(args, &out),
    }
}

fn weekly(args: WeeklyArgs, out: &OutputConfig) -> Result<()> {
    let client = args.github.client();
    let mut live = client.list_org_repos()?;
    live.sort();
    if live.binary_search(&args.output).is_err() {
        return Err(suggestions::unknown_repo(&args.output, client.owner(), &live));
    }

    let window = ReportWindow::trailing_week(Utc::now());
    info!("collecting events since {}", window.since);
    let report = weekly_report(&client, &live, &window)?;
    let body = report.render();

    if args.print {
        println!("# {}", window.title());
        print!("{}", body);
        return Ok(());
    }

    let url = client.create_issue(&args.output, &window.title(), &body)?;
    println!(
        "{} {} ({})",
        emoji(out, "✅", "[OK]"),
        url,
        report.stat
    );
    Ok(())
}
