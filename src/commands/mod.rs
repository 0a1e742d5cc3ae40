//! # CLI Command Implementations
//!
//! One module per subcommand of the `community` tool. Each defines a `clap`
//! `Args` struct and an `execute` function that loads configuration, builds
//! a GitHub client and calls into the `community_sync` library.
//!
//! The argument groups shared by several commands live here.

pub mod completions;
pub mod repo;
pub mod report;
pub mod team;
pub mod track;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use community_sync::config::{self, RepoPolicies, TeamSpec};
use community_sync::defaults;
use community_sync::github::client::GithubClient;
use community_sync::github::GithubOperations;
use community_sync::resolve::{resolve, Resolution};
use community_sync::suggestions;

/// Organization and credentials.
#[derive(Args, Debug)]
pub struct GithubArgs {
    /// GitHub organization to operate on
    #[arg(long, value_name = "ORG", env = "GITHUB_OWNER")]
    pub owner: String,

    /// Access token with `admin:org` and `repo` scopes
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: String,

    /// GitHub REST endpoint, for GitHub Enterprise
    #[arg(long, value_name = "URL", env = "GITHUB_API_URL", default_value = defaults::API_URL)]
    pub api_url: String,
}

impl GithubArgs {
    pub fn client(&self) -> GithubClient {
        GithubClient::new(&self.api_url, &self.owner, &self.token)
    }
}

/// Location of `repos.toml`.
#[derive(Args, Debug)]
pub struct ReposFileArgs {
    /// Path to repos.toml
    #[arg(long, value_name = "FILE", env = "COMMUNITY_REPOS", default_value = defaults::REPOS_FILE)]
    pub repos: PathBuf,
}

/// Location of `teams.toml`.
#[derive(Args, Debug)]
pub struct TeamsFileArgs {
    /// Path to teams.toml
    #[arg(long, value_name = "FILE", env = "COMMUNITY_TEAMS", default_value = defaults::TEAMS_FILE)]
    pub teams: PathBuf,
}

pub fn load_repos(path: &Path) -> Result<RepoPolicies> {
    if !path.exists() {
        return Err(suggestions::config_not_found(path, "--repos", "COMMUNITY_REPOS"));
    }
    Ok(config::repos_from_file(path)?)
}

pub fn load_teams(path: &Path) -> Result<Vec<TeamSpec>> {
    if !path.exists() {
        return Err(suggestions::config_not_found(path, "--teams", "COMMUNITY_TEAMS"));
    }
    Ok(config::teams_from_file(path)?)
}

/// Lists live repositories and resolves `policies` against them.
pub fn resolve_live(
    ops: &dyn GithubOperations,
    policies: &RepoPolicies,
) -> Result<(Vec<String>, Resolution)> {
    let live = ops.list_org_repos()?;
    let resolution = resolve(policies, &live)?;
    Ok((live, resolution))
}
