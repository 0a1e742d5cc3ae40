//! # Configuration Schema and Parsing
//!
//! This module defines the data structures behind the two TOML documents that
//! describe the desired state of the organization, and the logic for parsing
//! them.
//!
//! ## `repos.toml`
//!
//! Keyed by a glob pattern. Each entry is a [`RepoPolicy`]:
//!
//! ```toml
//! ["*"]
//! project = ["community"]
//!
//! ["go-service-*"]
//! project = ["storage"]
//! action = { required = ["lint", "unit-test"], allowed = ["release"] }
//! ```
//!
//! Every field is optional and defaults to empty.
//!
//! ## `teams.toml`
//!
//! Two layouts are accepted, and may be mixed in one file:
//!
//! 1.  **Grouped**: keyed by team name, with members listed per role. One
//!     entry expands into one [`TeamSpec`] per [`Role`], named
//!     `<team>-<role>`.
//! 2.  **Flat**: keyed by the team slug, with an explicit `role` key. One
//!     entry is exactly one [`TeamSpec`].
//!
//! A table carrying a `role` key is treated as flat.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Trust level of a team, ordered from least to most trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Contributor,
    Reviewer,
    Committer,
    Maintainer,
    /// Also accepted as `admin`.
    Leader,
}

impl Role {
    /// Every role, most trusted first.
    pub const ALL: [Role; 5] = [
        Role::Leader,
        Role::Maintainer,
        Role::Committer,
        Role::Reviewer,
        Role::Contributor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Leader => "leader",
            Role::Maintainer => "maintainer",
            Role::Committer => "committer",
            Role::Reviewer => "reviewer",
            Role::Contributor => "contributor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "leader" | "admin" => Ok(Role::Leader),
            "maintainer" => Ok(Role::Maintainer),
            "committer" => Ok(Role::Committer),
            "reviewer" => Ok(Role::Reviewer),
            "contributor" => Ok(Role::Contributor),
            other => Err(Error::ConfigParse {
                message: format!("unknown role '{}'", other),
                hint: Some(
                    "Use one of leader, maintainer, committer, reviewer, contributor".to_string(),
                ),
            }),
        }
    }
}

/// Workflow policy of a repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPolicy {
    /// Workflows that must exist with exactly the reference content.
    #[serde(default)]
    pub required: BTreeSet<String>,
    /// Workflows that may exist and are never touched.
    #[serde(default)]
    pub allowed: BTreeSet<String>,
}

impl ActionPolicy {
    pub fn is_required(&self, name: &str) -> bool {
        self.required.contains(name)
    }

    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }
}

/// One entry of `repos.toml`, before it is matched against live repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoPolicy {
    /// Projects this repository belongs to.
    #[serde(default, rename = "project")]
    pub projects: BTreeSet<String>,
    #[serde(default)]
    pub action: ActionPolicy,
}

/// Raw `repos.toml`: pattern to policy.
pub type RepoPolicies = BTreeMap<String, RepoPolicy>;

/// One GitHub team at one trust level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSpec {
    /// The GitHub team slug (also used as the team name on creation).
    pub slug: String,
    pub role: Role,
    pub description: String,
    /// All repositories of this project are granted to the team.
    pub project: Option<String>,
    /// Repository names or glob patterns granted to the team.
    pub repos: BTreeSet<String>,
    pub members: BTreeSet<String>,
}

/// Format the slug of the team holding `role` within `team`.
pub fn format_team_slug(team: &str, role: Role) -> String {
    format!("{}-{}", team, role)
}

#[derive(Debug, Deserialize)]
struct GroupedTeam {
    #[serde(default)]
    description: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    repos: BTreeSet<String>,
    #[serde(default)]
    members: BTreeMap<String, BTreeSet<String>>,
}

#[derive(Debug, Deserialize)]
struct FlatTeam {
    role: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    repos: BTreeSet<String>,
    #[serde(default)]
    members: BTreeSet<String>,
}

fn config_error(message: impl Into<String>) -> Error {
    Error::ConfigParse {
        message: message.into(),
        hint: None,
    }
}

/// Parses a `repos.toml` document.
pub fn parse_repos(content: &str) -> Result<RepoPolicies> {
    toml::from_str(content).map_err(|e| Error::ConfigParse {
        message: e.to_string(),
        hint: Some("Each key is a glob pattern mapping to `project` and `action`".to_string()),
    })
}

/// Parses a `teams.toml` document into one `TeamSpec` per (team, role).
///
/// The result is sorted by slug. Two entries producing the same slug are
/// rejected.
pub fn parse_teams(content: &str) -> Result<Vec<TeamSpec>> {
    let table: toml::Table = toml::from_str(content).map_err(|e| config_error(e.to_string()))?;

    let mut specs: BTreeMap<String, TeamSpec> = BTreeMap::new();
    for (key, value) in table {
        let is_flat = value
            .as_table()
            .map(|t| t.contains_key("role"))
            .ok_or_else(|| config_error(format!("team '{}' must be a table", key)))?;

        let expanded = if is_flat {
            let flat: FlatTeam = value
                .try_into()
                .map_err(|e: toml::de::Error| config_error(format!("team '{}': {}", key, e)))?;
            vec![TeamSpec {
                slug: key.clone(),
                role: flat.role.parse()?,
                description: flat.description,
                project: flat.project,
                repos: flat.repos,
                members: flat.members,
            }]
        } else {
            let grouped: GroupedTeam = value
                .try_into()
                .map_err(|e: toml::de::Error| config_error(format!("team '{}': {}", key, e)))?;
            expand_grouped(&key, grouped)?
        };

        for spec in expanded {
            if specs.contains_key(&spec.slug) {
                return Err(Error::ConfigParse {
                    message: format!("team slug '{}' is defined more than once", spec.slug),
                    hint: Some("Rename the flat entry or the grouped team".to_string()),
                });
            }
            specs.insert(spec.slug.clone(), spec);
        }
    }

    Ok(specs.into_values().collect())
}

fn expand_grouped(team: &str, grouped: GroupedTeam) -> Result<Vec<TeamSpec>> {
    let mut members_by_role: BTreeMap<Role, BTreeSet<String>> = BTreeMap::new();
    for (role, logins) in grouped.members {
        let role: Role = role.parse()?;
        members_by_role.entry(role).or_default().extend(logins);
    }

    Ok(Role::ALL
        .iter()
        .map(|role| TeamSpec {
            slug: format_team_slug(team, *role),
            role: *role,
            description: grouped.description.clone(),
            project: grouped.project.clone(),
            repos: grouped.repos.clone(),
            members: members_by_role.remove(role).unwrap_or_default(),
        })
        .collect())
}

/// Parse `repos.toml` from a file path
pub fn repos_from_file<P: AsRef<Path>>(path: P) -> Result<RepoPolicies> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse_repos(&content)
}

/// Parse `teams.toml` from a file path
pub fn teams_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<TeamSpec>> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse_teams(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repos() {
        let toml = r#"
["*"]
project = ["community"]

["go-service-*"]
project = ["storage", "community"]
action = { required = ["lint", "unit-test"], allowed = ["release"] }
"#;
        let policies = parse_repos(toml).unwrap();
        assert_eq!(policies.len(), 2);

        let catch_all = &policies["*"];
        assert!(catch_all.action.required.is_empty());
        assert!(catch_all.projects.contains("community"));

        let service = &policies["go-service-*"];
        assert_eq!(service.projects.len(), 2);
        assert!(service.action.is_required("lint"));
        assert!(service.action.is_allowed("release"));
        assert!(!service.action.is_allowed("lint"));
    }

    #[test]
    fn test_parse_repos_all_fields_optional() {
        let policies = parse_repos("[\"docs\"]\n").unwrap();
        assert_eq!(policies["docs"], RepoPolicy::default());
    }

    #[test]
    fn test_parse_repos_empty_document() {
        assert!(parse_repos("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_repos_invalid() {
        let err = parse_repos("[\"docs\"\nproject = 1").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_grouped_team() {
        let toml = r#"
[specs]
description = "Specification maintainers"
repos = ["specs"]

[specs.members]
leader = ["example"]
committer = ["alice", "bob"]
"#;
        let teams = parse_teams(toml).unwrap();
        assert_eq!(teams.len(), Role::ALL.len());

        let leader = teams.iter().find(|t| t.slug == "specs-leader").unwrap();
        assert_eq!(leader.role, Role::Leader);
        assert_eq!(leader.members.iter().collect::<Vec<_>>(), vec!["example"]);
        assert!(leader.repos.contains("specs"));

        let committer = teams.iter().find(|t| t.slug == "specs-committer").unwrap();
        assert_eq!(committer.members.len(), 2);

        let reviewer = teams.iter().find(|t| t.slug == "specs-reviewer").unwrap();
        assert!(reviewer.members.is_empty());
        assert!(reviewer.repos.contains("specs"));
    }

    #[test]
    fn test_admin_is_alias_of_leader() {
        let toml = r#"
[site.members]
admin = ["root"]
leader = ["chief"]
"#;
        let teams = parse_teams(toml).unwrap();
        let leader = teams.iter().find(|t| t.slug == "site-leader").unwrap();
        assert_eq!(leader.members.len(), 2);
    }

    #[test]
    fn test_parse_flat_team() {
        let toml = r#"
[storage-maintainer]
role = "maintainer"
project = "storage"
members = ["carol"]
"#;
        let teams = parse_teams(toml).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].slug, "storage-maintainer");
        assert_eq!(teams[0].role, Role::Maintainer);
        assert_eq!(teams[0].project.as_deref(), Some("storage"));
        assert!(teams[0].repos.is_empty());
    }

    #[test]
    fn test_parse_teams_sorted_by_slug() {
        let toml = r#"
[zeta-reviewer]
role = "reviewer"

[alpha-reviewer]
role = "reviewer"
"#;
        let teams = parse_teams(toml).unwrap();
        assert_eq!(teams[0].slug, "alpha-reviewer");
        assert_eq!(teams[1].slug, "zeta-reviewer");
    }

    #[test]
    fn test_unknown_role_has_hint() {
        let toml = r#"
[ops]
role = "owner"
"#;
        let err = parse_teams(toml).unwrap_err();
        let display = err.to_string();
        assert!(display.contains("unknown role 'owner'"));
        assert!(display.contains("hint:"));
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let toml = r#"
[docs.members]
leader = ["a"]

[docs-leader]
role = "leader"
"#;
        let err = parse_teams(toml).unwrap_err();
        assert!(err.to_string().contains("docs-leader"));
    }

    #[test]
    fn test_non_table_team_rejected() {
        let err = parse_teams("docs = 3").unwrap_err();
        assert!(err.to_string().contains("must be a table"));
    }

    #[test]
    fn test_role_order() {
        assert!(Role::Leader > Role::Maintainer);
        assert!(Role::Maintainer > Role::Committer);
        assert!(Role::Committer > Role::Reviewer);
        assert!(Role::Reviewer > Role::Contributor);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Leader);
    }

    #[test]
    fn test_from_file_nonexistent() {
        assert!(repos_from_file("nonexistent_repos.toml").is_err());
        assert!(teams_from_file("nonexistent_teams.toml").is_err());
    }
}
