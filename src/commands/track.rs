//! # Track Command Implementation
//!
//! `community track` opens the same issue, with its body read from a local
//! Markdown file, in every live repository whose name matches `--repo`.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use community_sync::github::GithubOperations;
use community_sync::output::{emoji, OutputConfig};
use community_sync::pattern::Matcher;
use community_sync::suggestions;
use community_sync::track::{create_tracking_issues, tracked_repos};

use super::GithubArgs;

/// Open a tracking issue in every matching repository
#[derive(Args, Debug)]
pub struct TrackArgs {
    #[command(flatten)]
    pub github: GithubArgs,

    /// Glob selecting the repositories, e.g. `go-service-*`
    #[arg(long, value_name = "GLOB")]
    pub repo: String,

    /// Issue title
    #[arg(long)]
    pub title: String,

    /// Markdown file holding the issue body
    #[arg(long, value_name = "FILE")]
    pub path: PathBuf,

    /// List the target repositories without opening issues
    #[arg(long)]
    pub dry_run: bool,
}

pub fn execute(args: TrackArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    if let Err(err) = Matcher::compile(&args.repo) {
        return Err(suggestions::invalid_glob(&args.repo, &err.to_string()));
    }
    let body = fs::read_to_string(&args.path)
        .with_context(|| format!("failed to read issue body {}", args.path.display()))?;

    let client = args.github.client();
    let targets = tracked_repos(&args.repo, &client.list_org_repos()?)?;
    if targets.is_empty() {
        return Err(suggestions::no_repos_matched(&args.repo, client.owner()));
    }

    if args.dry_run {
        for repo in &targets {
            println!("{}", out.added(repo));
        }
        println!(
            "{} would open {} issues",
            emoji(&out, "✅", "[OK]"),
            targets.len()
        );
        return Ok(());
    }

    let created = create_tracking_issues(&client, &targets, &args.title, &body)?;
    for (_, url) in &created {
        println!("{}", out.added(url));
    }
    println!(
        "{} opened {} issues",
        emoji(&out, "✅", "[OK]"),
        created.len()
    );
    Ok(())
}
