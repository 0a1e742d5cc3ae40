//! # Team Command Implementation
//!
//! `community team sync` creates missing teams and converges their repository
//! grants and membership. `community team contributors` invites outside
//! contributors of tracked repositories to the organization.
//!
//! Both accept `--dry-run`, which reads remote state and prints the plan
//! without any mutating call.

use anyhow::Result;
use clap::{Args, Subcommand};

use community_sync::github::GithubOperations;
use community_sync::output::{emoji, OutputConfig};
use community_sync::reconcile::contributors::{apply_contributors, plan_contributors};
use community_sync::reconcile::teams::{TeamPlan, TeamSync};
use community_sync::reconcile::PermissionTable;
use community_sync::resolve::project_index;

use super::{load_repos, load_teams, resolve_live, GithubArgs, ReposFileArgs, TeamsFileArgs};

/// Maintain organization teams
#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(subcommand)]
    pub command: TeamCommand,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Create missing teams and converge their repositories and members
    Sync(TeamSyncArgs),

    /// Invite outside contributors of tracked repositories
    Contributors(TeamSyncArgs),
}

#[derive(Args, Debug)]
pub struct TeamSyncArgs {
    #[command(flatten)]
    pub github: GithubArgs,

    #[command(flatten)]
    pub repos: ReposFileArgs,

    #[command(flatten)]
    pub teams: TeamsFileArgs,

    /// Print the plan without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(args: TeamArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    match args.command {
        TeamCommand::Sync(args) => sync(args, &out),
        TeamCommand::Contributors(args) => contributors(args, &out),
    }
}

fn print_plan(out: &OutputConfig, plan: &TeamPlan) {
    if plan.is_empty() {
        return;
    }
    println!("{}", out.heading(&format!("team {} ({})", plan.slug, plan.role)));
    for repo in &plan.repos.to_add {
        println!("{}", out.added(&format!("grant {} on {}", plan.permission, repo)));
    }
    for repo in &plan.repos.to_remove {
        println!("{}", out.removed(&format!("revoke {}", repo)));
    }
    for login in &plan.members.to_add {
        println!("{}", out.added(&format!("member {}", login)));
    }
    for login in &plan.members.to_remove {
        println!("{}", out.removed(&format!("member {}", login)));
    }
}

fn sync(args: TeamSyncArgs, out: &OutputConfig) -> Result<()> {
    let teams = load_teams(&args.teams.teams)?;
    let policies = load_repos(&args.repos.repos)?;
    let client = args.github.client();

    println!(
        "{} Reading {} teams in {}",
        emoji(out, "🔍", "[SCAN]"),
        teams.len(),
        client.owner()
    );
    let (live, resolution) = resolve_live(&client, &policies)?;
    let projects = project_index(&resolution.repos);
    let sync = TeamSync::new(&client, PermissionTable::default());

    let plans = if args.dry_run {
        for slug in sync.missing_teams(&teams)? {
            println!("{}", out.added(&format!("create team {}", slug)));
        }
        sync.plan_all(&teams, &live, &projects)?
    } else {
        for slug in sync.setup_teams(&teams)? {
            println!("{}", out.added(&format!("created team {}", slug)));
        }
        let plans = sync.plan_all(&teams, &live, &projects)?;
        for plan in &plans {
            sync.apply(plan)?;
        }
        plans
    };

    for plan in &plans {
        print_plan(out, plan);
    }
    let changes: usize = plans.iter().map(|p| p.repos.len() + p.members.len()).sum();
    let verb = if args.dry_run { "planned" } else { "applied" };
    println!("{} {} {} changes", emoji(out, "✅", "[OK]"), verb, changes);
    Ok(())
}

fn contributors(args: TeamSyncArgs, out: &OutputConfig) -> Result<()> {
    let teams = load_teams(&args.teams.teams)?;
    let policies = load_repos(&args.repos.repos)?;
    let client = args.github.client();

    let (_, resolution) = resolve_live(&client, &policies)?;
    let tracked: Vec<String> = resolution.repos.keys().cloned().collect();
    println!(
        "{} Reading contributors of {} repositories",
        emoji(out, "🔍", "[SCAN]"),
        tracked.len()
    );

    let invitations = plan_contributors(&client, &tracked, &teams)?;
    for login in invitations.keys() {
        println!("{}", out.added(&format!("invite {}", login)));
    }
    if !args.dry_run {
        apply_contributors(&client, &invitations)?;
    }

    let verb = if args.dry_run { "would invite" } else { "invited" };
    println!(
        "{} {} {} contributors",
        emoji(out, "✅", "[OK]"),
        verb,
        invitations.len()
    );
    Ok(())
}
