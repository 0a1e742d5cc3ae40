//! # Repo Command Implementation
//!
//! `community repo sync-actions` compares every tracked repository's
//! `.github/workflows` directory with the reference copies in the local
//! actions directory. Stale or missing required workflows are fixed on a new
//! branch and proposed through a pull request; the default branch is never
//! written directly.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Args, Subcommand};

use community_sync::defaults;
use community_sync::output::{emoji, OutputConfig};
use community_sync::reconcile::actions::ActionSync;
use community_sync::suggestions;

use super::{load_repos, resolve_live, GithubArgs, ReposFileArgs};

/// Maintain repository workflow files
#[derive(Args, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommand,
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// Open pull requests that bring workflow files in line with repos.toml
    SyncActions(SyncActionsArgs),
}

#[derive(Args, Debug)]
pub struct SyncActionsArgs {
    #[command(flatten)]
    pub github: GithubArgs,

    #[command(flatten)]
    pub repos: ReposFileArgs,

    /// Directory holding the reference `<name>.yml` workflows
    #[arg(long, value_name = "DIR", env = "COMMUNITY_ACTIONS", default_value = defaults::ACTIONS_DIR)]
    pub actions: PathBuf,

    /// Print the planned file changes without opening pull requests
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(args: RepoArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    match args.command {
        RepoCommand::SyncActions(args) => sync_actions(args, &out),
    }
}

fn sync_actions(args: SyncActionsArgs, out: &OutputConfig) -> Result<()> {
    if !args.actions.is_dir() {
        return Err(suggestions::actions_dir_not_found(&args.actions));
    }
    let policies = load_repos(&args.repos.repos)?;
    let client = args.github.client();
    let (_, resolution) = resolve_live(&client, &policies)?;
    let sync = ActionSync::new(&client, &args.actions);

    println!(
        "{} Checking workflows of {} repositories",
        emoji(out, "🔍", "[SCAN]"),
        resolution.repos.len()
    );

    if args.dry_run {
        let mut pending = 0;
        for repo in resolution.repos.values() {
            let plan = sync.plan(repo)?;
            if plan.is_empty() {
                continue;
            }
            pending += 1;
            println!("{}", out.heading(&plan.repo));
            for removal in &plan.removals {
                println!("{}", out.removed(&removal.path));
            }
            for write in &plan.writes {
                println!("{}", out.added(&write.path));
            }
        }
        println!(
            "{} {} repositories need a pull request",
            emoji(out, "✅", "[OK]"),
            pending
        );
        return Ok(());
    }

    let opened = sync.sync_actions(resolution.repos.values(), Utc::now())?;
    for (repo, url) in &opened {
        println!("{}", out.added(&format!("{}: {}", repo, url)));
    }
    println!(
        "{} opened {} pull requests",
        emoji(out, "✅", "[OK]"),
        opened.len()
    );
    Ok(())
}
