//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks
//! `repos.toml` and `teams.toml` without changing anything on GitHub.
//!
//! ## Functionality
//!
//! - **Parsing**: both files must parse against their schemas.
//! - **Pattern Validation**: every `repos.toml` key and every team repository
//!   entry must be a valid glob.
//! - **Project References**: a team's `project` should be declared by some
//!   `repos.toml` entry; unknown projects are reported as warnings.
//! - **Collisions** (`--remote`): resolves against the live repository list
//!   and reports repositories matched by equal-length patterns.
//!
//! `--strict` turns warnings and collisions into a failing exit status.

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;

use community_sync::defaults;
use community_sync::github::client::GithubClient;
use community_sync::output::{emoji, OutputConfig};
use community_sync::pattern::Matcher;

use super::{load_repos, load_teams, resolve_live, ReposFileArgs, TeamsFileArgs};

/// Validate repos.toml and teams.toml
#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub repos: ReposFileArgs,

    #[command(flatten)]
    pub teams: TeamsFileArgs,

    /// Also resolve against the organization's live repositories
    #[arg(long, requires = "owner")]
    pub remote: bool,

    /// Treat warnings and pattern collisions as errors
    #[arg(long)]
    pub strict: bool,

    /// GitHub organization, used with --remote
    #[arg(long, value_name = "ORG", env = "GITHUB_OWNER")]
    pub owner: Option<String>,

    /// Access token, used with --remote
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// GitHub REST endpoint, used with --remote
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = defaults::API_URL)]
    pub api_url: String,
}

pub fn execute(args: ValidateArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);
    let mut has_errors = false;
    let mut has_warnings = false;

    println!(
        "{} Validating {} and {}",
        emoji(&out, "🔍", "[SCAN]"),
        args.repos.repos.display(),
        args.teams.teams.display()
    );

    let policies = load_repos(&args.repos.repos)?;
    let teams = load_teams(&args.teams.teams)?;
    println!(
        "{} Parsed {} repository patterns and {} teams",
        emoji(&out, "✅", "[OK]"),
        policies.len(),
        teams.len()
    );

    let team_patterns = teams
        .iter()
        .flat_map(|team| team.repos.iter().map(move |p| (team.slug.as_str(), p)));
    let repo_patterns = policies.keys().map(|p| ("repos.toml", p));
    for (origin, pattern) in repo_patterns.chain(team_patterns) {
        if let Err(e) = Matcher::compile(pattern) {
            println!("{} {}: {}", emoji(&out, "❌", "[ERR]"), origin, e);
            has_errors = true;
        }
    }

    let projects: BTreeSet<&str> = policies
        .values()
        .flat_map(|policy| policy.projects.iter().map(String::as_str))
        .collect();
    for team in &teams {
        if let Some(project) = &team.project {
            if !projects.contains(project.as_str()) {
                println!(
                    "{} {}: project '{}' is not declared in repos.toml",
                    emoji(&out, "⚠️", "[WARN]"),
                    team.slug,
                    project
                );
                has_warnings = true;
            }
        }
    }

    if args.remote && !has_errors {
        if let Some(owner) = &args.owner {
            let client = GithubClient::new(
                &args.api_url,
                owner,
                args.token.as_deref().unwrap_or_default(),
            );
            println!(
                "\n{} Resolving against {}...",
                emoji(&out, "🌐", "[NET]"),
                owner
            );
            let (live, resolution) = resolve_live(&client, &policies)?;
            println!(
                "   {} of {} live repositories matched",
                resolution.repos.len(),
                live.len()
            );
            for collision in &resolution.collisions {
                println!(
                    "{} {} matched by equal-length patterns: {}",
                    emoji(&out, "⚠️", "[WARN]"),
                    collision.repo,
                    collision.patterns.join(", ")
                );
                has_warnings = true;
            }
        }
    }

    println!("\n{} Validation Result:", emoji(&out, "🎯", "[RESULT]"));

    if has_errors {
        println!(
            "{} Configuration has errors that must be fixed",
            emoji(&out, "❌", "[ERR]")
        );
        return Err(anyhow::anyhow!("Configuration validation failed"));
    }

    if has_warnings && args.strict {
        println!(
            "{} Configuration has warnings (strict mode enabled)",
            emoji(&out, "❌", "[ERR]")
        );
        return Err(anyhow::anyhow!(
            "Configuration validation failed in strict mode"
        ));
    }

    if has_warnings {
        println!(
            "{} Configuration is valid but has warnings",
            emoji(&out, "⚠️", "[WARN]")
        );
    } else {
        println!("{} Configuration is valid", emoji(&out, "✅", "[OK]"));
    }

    if !args.remote {
        println!(
            "\n{} Tip: Use --remote to also check for pattern collisions",
            emoji(&out, "💡", "[TIP]")
        );
    }

    Ok(())
}
