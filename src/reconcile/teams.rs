//! Team bootstrap, repository grants and membership.

use std::collections::{BTreeMap, BTreeSet};

use log::info;

use super::{Diff, PermissionTable};
use crate::config::{Role, TeamSpec};
use crate::error::Result;
use crate::github::{GithubOperations, TeamPrivacy};
use crate::resolve::desired_repos;

/// Changes needed to converge one team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPlan {
    pub slug: String,
    pub role: Role,
    /// Permission granted for every added repository.
    pub permission: String,
    pub repos: Diff<String>,
    pub members: Diff<String>,
}

impl TeamPlan {
    pub fn is_empty(&self) -> bool {
        self.repos.is_empty() && self.members.is_empty()
    }
}

/// Existing state of a team that may not have been created yet.
fn existing(result: Result<BTreeSet<String>>) -> Result<BTreeSet<String>> {
    match result {
        Err(e) if e.is_not_found() => Ok(BTreeSet::new()),
        other => other,
    }
}

/// Reconciles teams through a [`GithubOperations`] implementation.
pub struct TeamSync<'a> {
    ops: &'a dyn GithubOperations,
    permissions: PermissionTable,
}

impl<'a> TeamSync<'a> {
    pub fn new(ops: &'a dyn GithubOperations, permissions: PermissionTable) -> Self {
        Self { ops, permissions }
    }

    /// Slugs of configured teams that do not exist remotely.
    ///
    /// Only a not-found answer marks a team as missing; any other error
    /// aborts.
    pub fn missing_teams(&self, teams: &[TeamSpec]) -> Result<Vec<String>> {
        let mut missing = Vec::new();
        for team in teams {
            match self.ops.get_team(&team.slug) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => missing.push(team.slug.clone()),
                Err(e) => return Err(e),
            }
        }
        Ok(missing)
    }

    /// Creates every missing team with closed privacy. Returns the created slugs.
    pub fn setup_teams(&self, teams: &[TeamSpec]) -> Result<Vec<String>> {
        let missing = self.missing_teams(teams)?;
        for slug in &missing {
            self.ops.create_team(slug, TeamPrivacy::Closed)?;
            info!("created team {}", slug);
        }
        Ok(missing)
    }

    pub fn plan_repos(&self, team: &TeamSpec, desired: &BTreeSet<String>) -> Result<Diff<String>> {
        let existing = existing(self.ops.list_team_repos(&team.slug))?;
        Ok(Diff::compute(&existing, desired))
    }

    pub fn plan_members(&self, team: &TeamSpec) -> Result<Diff<String>> {
        let existing = existing(self.ops.list_team_members(&team.slug))?;
        Ok(Diff::compute_logins(&existing, &team.members))
    }

    pub fn plan(&self, team: &TeamSpec, desired: &BTreeSet<String>) -> Result<TeamPlan> {
        Ok(TeamPlan {
            slug: team.slug.clone(),
            role: team.role,
            permission: self.permissions.permission(team.role).to_string(),
            repos: self.plan_repos(team, desired)?,
            members: self.plan_members(team)?,
        })
    }

    /// Plans every team, expanding repository patterns against `live_repos`.
    pub fn plan_all(
        &self,
        teams: &[TeamSpec],
        live_repos: &[String],
        projects: &BTreeMap<String, BTreeSet<String>>,
    ) -> Result<Vec<TeamPlan>> {
        teams
            .iter()
            .map(|team| {
                let desired = desired_repos(team, live_repos, projects)?;
                self.plan(team, &desired)
            })
            .collect()
    }

    pub fn apply_repos(&self, slug: &str, permission: &str, diff: &Diff<String>) -> Result<()> {
        for repo in &diff.to_add {
            self.ops.add_team_repo(slug, repo, permission)?;
            info!("granted {} on {} to team {}", permission, repo, slug);
        }
        for repo in &diff.to_remove {
            self.ops.remove_team_repo(slug, repo)?;
            info!("revoked {} from team {}", repo, slug);
        }
        Ok(())
    }

    pub fn apply_members(&self, slug: &str, diff: &Diff<String>) -> Result<()> {
        for login in &diff.to_add {
            self.ops.add_team_member(slug, login)?;
            info!("added {} to team {}", login, slug);
        }
        for login in &diff.to_remove {
            self.ops.remove_team_member(slug, login)?;
            info!("removed {} from team {}", login, slug);
        }
        Ok(())
    }

    pub fn apply(&self, plan: &TeamPlan) -> Result<()> {
        self.apply_repos(&plan.slug, &plan.permission, &plan.repos)?;
        self.apply_members(&plan.slug, &plan.members)
    }

    /// Converges the repository grants of one existing team.
    pub fn sync_team_repos(&self, team: &TeamSpec, desired: &BTreeSet<String>) -> Result<Diff<String>> {
        let diff = self.plan_repos(team, desired)?;
        self.apply_repos(&team.slug, self.permissions.permission(team.role), &diff)?;
        Ok(diff)
    }

    /// Converges the membership of one existing team.
    pub fn sync_team_members(&self, team: &TeamSpec) -> Result<Diff<String>> {
        let diff = self.plan_members(team)?;
        self.apply_members(&team.slug, &diff)?;
        Ok(diff)
    }

    /// Bootstraps every team, then converges grants and membership.
    ///
    /// No team is reconciled until all of them exist.
    pub fn sync(
        &self,
        teams: &[TeamSpec],
        live_repos: &[String],
        projects: &BTreeMap<String, BTreeSet<String>>,
    ) -> Result<Vec<TeamPlan>> {
        self.setup_teams(teams)?;
        let plans = self.plan_all(teams, live_repos, projects)?;
        for plan in &plans {
            self.apply(plan)?;
        }
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::github::memory::{MemoryGithub, Mutation};

    fn team(slug: &str, role: Role, repos: &[&str], members: &[&str]) -> TeamSpec {
        TeamSpec {
            slug: slug.to_string(),
            role,
            description: String::new(),
            project: None,
            repos: repos.iter().map(|s| s.to_string()).collect(),
            members: members.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn org() -> MemoryGithub {
        let github = MemoryGithub::new("acme");
        for repo in ["A", "B", "C", "D"] {
            github.seed_repo(repo);
        }
        github
    }

    #[test]
    fn test_setup_creates_only_missing_teams() {
        let github = org();
        github.seed_team("docs-leader");
        let sync = TeamSync::new(&github, PermissionTable::default());

        let teams = vec![
            team("docs-leader", Role::Leader, &[], &[]),
            team("docs-reviewer", Role::Reviewer, &[], &[]),
        ];
        let created = sync.setup_teams(&teams).unwrap();

        assert_eq!(created, vec!["docs-reviewer"]);
        assert_eq!(github.team_privacy("docs-reviewer"), Some(TeamPrivacy::Closed));
        assert_eq!(github.mutations().len(), 1);
    }

    #[test]
    fn test_setup_aborts_on_other_errors() {
        let github = org();
        github.fail_on("get_team");
        let sync = TeamSync::new(&github, PermissionTable::default());

        let err = sync
            .setup_teams(&[team("docs-leader", Role::Leader, &[], &[])])
            .unwrap_err();
        assert!(matches!(err, Error::Remote { .. }));
        assert!(github.mutations().is_empty());
    }

    #[test]
    fn test_sync_team_repos_applies_diff_with_role_permission() {
        let github = org();
        github.seed_team("core-committer");
        for repo in ["A", "B", "C"] {
            github.seed_team_repo("core-committer", repo, "push");
        }
        let sync = TeamSync::new(&github, PermissionTable::default());
        let spec = team("core-committer", Role::Committer, &[], &[]);

        let diff = sync.sync_team_repos(&spec, &set(&["B", "C", "D"])).unwrap();
        assert_eq!(diff.to_add, set(&["D"]));
        assert_eq!(diff.to_remove, set(&["A"]));

        let grants = github.team_grants("core-committer");
        assert_eq!(grants.keys().cloned().collect::<BTreeSet<_>>(), set(&["B", "C", "D"]));
        assert_eq!(grants["D"], "push");
    }

    #[test]
    fn test_sync_team_repos_is_idempotent() {
        let github = org();
        github.seed_team("core-leader");
        let sync = TeamSync::new(&github, PermissionTable::default());
        let spec = team("core-leader", Role::Leader, &[], &[]);
        let desired = set(&["A", "C"]);

        sync.sync_team_repos(&spec, &desired).unwrap();
        github.clear_mutations();

        let second = sync.sync_team_repos(&spec, &desired).unwrap();
        assert!(second.is_empty());
        assert!(github.mutations().is_empty());
    }

    #[test]
    fn test_sync_team_members() {
        let github = org();
        github.seed_team("core-reviewer");
        github.seed_team_member("core-reviewer", "old");
        github.seed_team_member("core-reviewer", "kept");
        let sync = TeamSync::new(&github, PermissionTable::default());

        let spec = team("core-reviewer", Role::Reviewer, &[], &["kept", "new"]);
        sync.sync_team_members(&spec).unwrap();

        assert_eq!(
            github.mutations(),
            vec![
                Mutation::AddTeamMember {
                    slug: "core-reviewer".to_string(),
                    login: "new".to_string()
                },
                Mutation::RemoveTeamMember {
                    slug: "core-reviewer".to_string(),
                    login: "old".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_member_logins_match_regardless_of_case() {
        let github = org();
        github.seed_team("core-reviewer");
        github.seed_team_member("core-reviewer", "alice");
        let sync = TeamSync::new(&github, PermissionTable::default());

        let spec = team("core-reviewer", Role::Reviewer, &[], &["Alice"]);
        let diff = sync.sync_team_members(&spec).unwrap();

        assert!(diff.is_empty());
        assert!(github.mutations().is_empty());
        assert_eq!(github.list_team_members("core-reviewer").unwrap(), set(&["alice"]));
    }

    #[test]
    fn test_pending_team_invitation_is_not_added_twice() {
        let github = org();
        github.seed_team("core-reviewer");
        github.seed_org_member("kept");
        let sync = TeamSync::new(&github, PermissionTable::default());
        let spec = team("core-reviewer", Role::Reviewer, &[], &["kept", "outsider"]);

        let first = sync.sync_team_members(&spec).unwrap();
        assert_eq!(first.to_add, set(&["kept", "outsider"]));
        assert_eq!(github.team_invitations("core-reviewer"), set(&["outsider"]));
        github.clear_mutations();

        let second = sync.sync_team_members(&spec).unwrap();
        assert!(second.is_empty());
        assert!(github.mutations().is_empty());
    }

    #[test]
    fn test_plan_for_missing_team_starts_empty() {
        let github = org();
        let sync = TeamSync::new(&github, PermissionTable::default());
        let spec = team("new-maintainer", Role::Maintainer, &["A"], &["carol"]);

        let plan = sync.plan(&spec, &set(&["A"])).unwrap();
        assert_eq!(plan.permission, "maintain");
        assert_eq!(plan.repos.to_add, set(&["A"]));
        assert_eq!(plan.members.to_add, set(&["carol"]));
        assert!(github.mutations().is_empty());
    }

    #[test]
    fn test_sync_creates_teams_before_granting() {
        let github = org();
        let sync = TeamSync::new(&github, PermissionTable::default());
        let teams = vec![
            team("x-leader", Role::Leader, &["A"], &[]),
            team("y-leader", Role::Leader, &["B"], &[]),
        ];
        let live: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();

        sync.sync(&teams, &live, &BTreeMap::new()).unwrap();

        let mutations = github.mutations();
        assert!(matches!(mutations[0], Mutation::CreateTeam { .. }));
        assert!(matches!(mutations[1], Mutation::CreateTeam { .. }));
        assert!(matches!(mutations[2], Mutation::AddTeamRepo { .. }));
        assert_eq!(github.team_grants("y-leader")["B"], "admin");
    }
}
