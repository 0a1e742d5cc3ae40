//! # Community Sync Library
//!
//! Keeps a GitHub organization's teams, repository permissions, CI workflow
//! files and weekly activity reports in line with a declarative
//! configuration. The `community` binary is a thin shell over this crate.
//!
//! ## Quick Example
//!
//! ```
//! use community_sync::config::parse_repos;
//! use community_sync::github::memory::MemoryGithub;
//! use community_sync::github::GithubOperations;
//! use community_sync::resolve::resolve;
//!
//! let github = MemoryGithub::new("acme");
//! github.seed_repo("svc-api");
//! github.seed_repo("docs");
//!
//! let policies = parse_repos(r#"
//! ["*"]
//! ["svc-*"]
//! action = { required = ["lint"] }
//! "#).unwrap();
//!
//! let live = github.list_org_repos().unwrap();
//! let repos = resolve(&policies, &live).unwrap().repos;
//! assert!(repos["svc-api"].action.is_required("lint"));
//! assert!(repos["docs"].action.required.is_empty());
//! ```
//!
//! ## Core Concepts
//!
//! - **Configuration (`config`)**: the `repos.toml` and `teams.toml` schemas.
//! - **Patterns (`pattern`)**: glob matching of repository names.
//! - **Resolution (`resolve`)**: picks the most specific policy for every live
//!   repository and expands team repository patterns.
//! - **Remote state (`github`)**: the `GithubOperations` trait, a blocking REST
//!   client and an in-memory organization.
//! - **Reconciliation (`reconcile`)**: plans and applies team, contributor and
//!   workflow changes.
//! - **Reports (`activity`)** and **tracking issues (`track`)**.
//!
//! ## Execution Flow
//!
//! 1.  Parse configuration.
//! 2.  List live repositories and resolve policies against them.
//! 3.  Read existing remote state and diff it against the desired state.
//! 4.  Apply the diff through mutating calls, or print it on a dry run.

pub mod activity;
pub mod config;
pub mod defaults;
pub mod error;
pub mod github;
pub mod output;
pub mod pattern;
pub mod reconcile;
pub mod resolve;
pub mod suggestions;
pub mod track;

#[cfg(test)]
mod algebra_proptest;
