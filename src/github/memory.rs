//! In-memory GitHub organization.
//!
//! [`MemoryGithub`] implements [`GithubOperations`] over plain collections.
//! State is seeded through the `seed_*` methods, every successful mutating
//! call is appended to a [`Mutation`] log, and any operation can be made to
//! fail with [`MemoryGithub::fail_on`].
//!
//! File writes follow GitHub's contents API: updating or deleting a file
//! requires the sha of the current blob, and creating a file that already
//! exists without one is rejected.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::info;

use super::{prune_events, ActivityEvent, GithubOperations, TeamPrivacy, WorkflowFile};
use crate::error::{Error, Result};

const WORKFLOW_DIR: &str = ".github/workflows";
const DEFAULT_BRANCH: &str = "main";

/// One successful mutating call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateTeam { slug: String },
    AddTeamRepo { slug: String, repo: String, permission: String },
    RemoveTeamRepo { slug: String, repo: String },
    AddTeamMember { slug: String, login: String },
    RemoveTeamMember { slug: String, login: String },
    InviteOrgMember { user_id: u64 },
    CreateBranch { repo: String, branch: String },
    DeleteFile { repo: String, branch: String, path: String },
    PutFile { repo: String, branch: String, path: String },
    CreatePullRequest { repo: String, head: String, base: String },
    CreateIssue { repo: String, title: String },
}

/// A pull request opened against the in-memory organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub head: String,
    pub base: String,
    pub title: String,
    pub body: String,
}

/// An issue opened against the in-memory organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Default)]
struct Branch {
    head: String,
    files: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Default)]
struct Repo {
    archived: bool,
    default_branch: String,
    branches: BTreeMap<String, Branch>,
    contributors: BTreeMap<String, u64>,
    events: Vec<ActivityEvent>,
    issues: Vec<Issue>,
    pulls: Vec<PullRequest>,
}

impl Repo {
    fn next_number(&self) -> usize {
        self.issues.len() + self.pulls.len() + 1
    }
}

#[derive(Debug)]
struct Team {
    privacy: TeamPrivacy,
    repos: BTreeMap<String, String>,
    members: BTreeSet<String>,
    /// Logins invited to the team who are not organization members yet.
    pending: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct State {
    repos: BTreeMap<String, Repo>,
    teams: BTreeMap<String, Team>,
    org_members: BTreeSet<String>,
    /// Account id to login, learned from seeded contributors.
    users: BTreeMap<u64, String>,
    invitations: BTreeSet<u64>,
    failing: BTreeSet<String>,
    mutations: Vec<Mutation>,
    commits: u64,
}

impl State {
    fn repo(&self, name: &str) -> Result<&Repo> {
        self.repos.get(name).ok_or_else(|| not_found(format!("repository {}", name)))
    }

    fn repo_mut(&mut self, name: &str) -> Result<&mut Repo> {
        self.repos
            .get_mut(name)
            .ok_or_else(|| not_found(format!("repository {}", name)))
    }

    fn team_mut(&mut self, slug: &str) -> Result<&mut Team> {
        self.teams
            .get_mut(slug)
            .ok_or_else(|| not_found(format!("team {}", slug)))
    }

    fn next_commit(&mut self) -> String {
        self.commits += 1;
        format!("{:040x}", self.commits)
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.failing.contains(operation) {
            return Err(Error::Remote {
                operation: operation.to_string(),
                status: Some(500),
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found(resource: String) -> Error {
    Error::RemoteNotFound { resource }
}

fn conflict(operation: &str, message: &str) -> Error {
    Error::Remote {
        operation: operation.to_string(),
        status: Some(409),
        message: message.to_string(),
    }
}

/// Deterministic stand-in for a git blob sha.
pub fn blob_sha(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// An organization held entirely in memory.
#[derive(Debug)]
pub struct MemoryGithub {
    owner: String,
    state: Mutex<State>,
}

impl MemoryGithub {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            state: Mutex::new(State::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a repository with an empty `main` branch.
    pub fn seed_repo(&self, name: &str) {
        let mut state = self.state();
        let head = state.next_commit();
        let mut repo = Repo {
            default_branch: DEFAULT_BRANCH.to_string(),
            ..Repo::default()
        };
        repo.branches.insert(
            DEFAULT_BRANCH.to_string(),
            Branch {
                head,
                files: BTreeMap::new(),
            },
        );
        state.repos.insert(name.to_string(), repo);
    }

    pub fn archive_repo(&self, name: &str) {
        if let Some(repo) = self.state().repos.get_mut(name) {
            repo.archived = true;
        }
    }

    /// Writes `.github/workflows/<file_name>` on the default branch.
    pub fn seed_workflow(&self, repo: &str, file_name: &str, content: &[u8]) {
        let mut state = self.state();
        if let Some(repo) = state.repos.get_mut(repo) {
            let default_branch = repo.default_branch.clone();
            if let Some(branch) = repo.branches.get_mut(&default_branch) {
                branch
                    .files
                    .insert(format!("{}/{}", WORKFLOW_DIR, file_name), content.to_vec());
            }
        }
    }

    pub fn seed_team(&self, slug: &str) {
        self.state().teams.insert(
            slug.to_string(),
            Team {
                privacy: TeamPrivacy::Closed,
                repos: BTreeMap::new(),
                members: BTreeSet::new(),
                pending: BTreeSet::new(),
            },
        );
    }

    /// Grants a repository to an already seeded team.
    pub fn seed_team_repo(&self, slug: &str, repo: &str, permission: &str) {
        if let Some(team) = self.state().teams.get_mut(slug) {
            team.repos.insert(repo.to_string(), permission.to_string());
        }
    }

    pub fn seed_team_member(&self, slug: &str, login: &str) {
        if let Some(team) = self.state().teams.get_mut(slug) {
            team.members.insert(login.to_string());
        }
    }

    pub fn seed_org_member(&self, login: &str) {
        self.state().org_members.insert(login.to_string());
    }

    pub fn seed_contributor(&self, repo: &str, login: &str, user_id: u64) {
        let mut state = self.state();
        state.users.insert(user_id, login.to_string());
        if let Some(repo) = state.repos.get_mut(repo) {
            repo.contributors.insert(login.to_string(), user_id);
        }
    }

    pub fn seed_event(&self, repo: &str, event: ActivityEvent) {
        if let Some(repo) = self.state().repos.get_mut(repo) {
            repo.events.push(event);
        }
    }

    /// Makes every later call of the named trait operation fail.
    pub fn fail_on(&self, operation: &str) {
        self.state().failing.insert(operation.to_string());
    }

    /// Every successful mutating call, in order.
    pub fn mutations(&self) -> Vec<Mutation> {
        self.state().mutations.clone()
    }

    pub fn clear_mutations(&self) {
        self.state().mutations.clear();
    }

    pub fn team_exists(&self, slug: &str) -> bool {
        self.state().teams.contains_key(slug)
    }

    pub fn team_privacy(&self, slug: &str) -> Option<TeamPrivacy> {
        self.state().teams.get(slug).map(|t| t.privacy)
    }

    /// Repository to permission for one team.
    pub fn team_grants(&self, slug: &str) -> BTreeMap<String, String> {
        self.state()
            .teams
            .get(slug)
            .map(|t| t.repos.clone())
            .unwrap_or_default()
    }

    /// Logins with a pending invitation to one team.
    pub fn team_invitations(&self, slug: &str) -> BTreeSet<String> {
        self.state()
            .teams
            .get(slug)
            .map(|t| t.pending.clone())
            .unwrap_or_default()
    }

    pub fn invitations(&self) -> BTreeSet<u64> {
        self.state().invitations.clone()
    }

    /// Content of a file on a branch.
    pub fn file(&self, repo: &str, branch: &str, path: &str) -> Option<Vec<u8>> {
        self.state()
            .repos
            .get(repo)
            .and_then(|r| r.branches.get(branch))
            .and_then(|b| b.files.get(path).cloned())
    }

    pub fn branches(&self, repo: &str) -> Vec<String> {
        self.state()
            .repos
            .get(repo)
            .map(|r| r.branches.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn pull_requests(&self, repo: &str) -> Vec<PullRequest> {
        self.state()
            .repos
            .get(repo)
            .map(|r| r.pulls.clone())
            .unwrap_or_default()
    }

    pub fn issues(&self, repo: &str) -> Vec<Issue> {
        self.state()
            .repos
            .get(repo)
            .map(|r| r.issues.clone())
            .unwrap_or_default()
    }
}

impl GithubOperations for MemoryGithub {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn list_org_repos(&self) -> Result<Vec<String>> {
        let state = self.state();
        state.check("list_org_repos")?;
        for (name, repo) in &state.repos {
            if repo.archived {
                info!("repository {} is archived", name);
            }
        }
        Ok(state.repos.keys().cloned().collect())
    }

    fn get_team(&self, slug: &str) -> Result<()> {
        let state = self.state();
        state.check("get_team")?;
        if state.teams.contains_key(slug) {
            Ok(())
        } else {
            Err(not_found(format!("team {}", slug)))
        }
    }

    fn create_team(&self, slug: &str, privacy: TeamPrivacy) -> Result<()> {
        let mut state = self.state();
        state.check("create_team")?;
        if state.teams.contains_key(slug) {
            return Err(Error::Remote {
                operation: "create_team".to_string(),
                status: Some(422),
                message: format!("team {} already exists", slug),
            });
        }
        state.teams.insert(
            slug.to_string(),
            Team {
                privacy,
                repos: BTreeMap::new(),
                members: BTreeSet::new(),
                pending: BTreeSet::new(),
            },
        );
        state.mutations.push(Mutation::CreateTeam {
            slug: slug.to_string(),
        });
        Ok(())
    }

    fn list_team_repos(&self, slug: &str) -> Result<BTreeSet<String>> {
        let mut state = self.state();
        state.check("list_team_repos")?;
        Ok(state.team_mut(slug)?.repos.keys().cloned().collect())
    }

    fn add_team_repo(&self, slug: &str, repo: &str, permission: &str) -> Result<()> {
        let mut state = self.state();
        state.check("add_team_repo")?;
        state.repo(repo)?;
        state
            .team_mut(slug)?
            .repos
            .insert(repo.to_string(), permission.to_string());
        state.mutations.push(Mutation::AddTeamRepo {
            slug: slug.to_string(),
            repo: repo.to_string(),
            permission: permission.to_string(),
        });
        Ok(())
    }

    fn remove_team_repo(&self, slug: &str, repo: &str) -> Result<()> {
        let mut state = self.state();
        state.check("remove_team_repo")?;
        state.team_mut(slug)?.repos.remove(repo);
        state.mutations.push(Mutation::RemoveTeamRepo {
            slug: slug.to_string(),
            repo: repo.to_string(),
        });
        Ok(())
    }

    fn list_team_members(&self, slug: &str) -> Result<BTreeSet<String>> {
        let mut state = self.state();
        state.check("list_team_members")?;
        let team = state.team_mut(slug)?;
        Ok(team.members.union(&team.pending).cloned().collect())
    }

    fn add_team_member(&self, slug: &str, login: &str) -> Result<()> {
        let mut state = self.state();
        state.check("add_team_member")?;
        let is_org_member = state.org_members.contains(login);
        let team = state.team_mut(slug)?;
        if is_org_member {
            team.members.insert(login.to_string());
        } else {
            team.pending.insert(login.to_string());
        }
        state.mutations.push(Mutation::AddTeamMember {
            slug: slug.to_string(),
            login: login.to_string(),
        });
        Ok(())
    }

    fn remove_team_member(&self, slug: &str, login: &str) -> Result<()> {
        let mut state = self.state();
        state.check("remove_team_member")?;
        let team = state.team_mut(slug)?;
        team.members.remove(login);
        team.pending.remove(login);
        state.mutations.push(Mutation::RemoveTeamMember {
            slug: slug.to_string(),
            login: login.to_string(),
        });
        Ok(())
    }

    fn list_org_members(&self) -> Result<BTreeSet<String>> {
        let state = self.state();
        state.check("list_org_members")?;
        let mut members = state.org_members.clone();
        members.extend(
            state
                .invitations
                .iter()
                .filter_map(|id| state.users.get(id).cloned()),
        );
        Ok(members)
    }

    fn invite_org_member(&self, user_id: u64) -> Result<()> {
        let mut state = self.state();
        state.check("invite_org_member")?;
        state.invitations.insert(user_id);
        state.mutations.push(Mutation::InviteOrgMember { user_id });
        Ok(())
    }

    fn list_contributors(&self, repo: &str) -> Result<BTreeMap<String, u64>> {
        let state = self.state();
        state.check("list_contributors")?;
        Ok(state.repo(repo)?.contributors.clone())
    }

    fn list_workflow_files(&self, repo: &str) -> Result<Vec<WorkflowFile>> {
        let state = self.state();
        state.check("list_workflow_files")?;
        let repo = state.repo(repo)?;
        let prefix = format!("{}/", WORKFLOW_DIR);
        let files = repo
            .branches
            .get(&repo.default_branch)
            .map(|branch| {
                branch
                    .files
                    .iter()
                    .filter_map(|(path, content)| {
                        let name = path.strip_prefix(&prefix)?;
                        if name.contains('/') {
                            return None;
                        }
                        Some(WorkflowFile {
                            name: name.to_string(),
                            path: path.clone(),
                            sha: blob_sha(content),
                            content: content.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(files)
    }

    fn default_branch(&self, repo: &str) -> Result<String> {
        let state = self.state();
        state.check("default_branch")?;
        Ok(state.repo(repo)?.default_branch.clone())
    }

    fn branch_head(&self, repo: &str, branch: &str) -> Result<String> {
        let state = self.state();
        state.check("branch_head")?;
        state
            .repo(repo)?
            .branches
            .get(branch)
            .map(|b| b.head.clone())
            .ok_or_else(|| not_found(format!("branch {} of {}", branch, repo)))
    }

    fn create_branch(&self, repo: &str, branch: &str, sha: &str) -> Result<()> {
        let mut state = self.state();
        state.check("create_branch")?;
        let target = state.repo_mut(repo)?;
        if target.branches.contains_key(branch) {
            return Err(Error::Remote {
                operation: "create_branch".to_string(),
                status: Some(422),
                message: "Reference already exists".to_string(),
            });
        }
        let files = target
            .branches
            .values()
            .find(|b| b.head == sha)
            .map(|b| b.files.clone())
            .ok_or_else(|| not_found(format!("commit {}", sha)))?;
        target.branches.insert(
            branch.to_string(),
            Branch {
                head: sha.to_string(),
                files,
            },
        );
        state.mutations.push(Mutation::CreateBranch {
            repo: repo.to_string(),
            branch: branch.to_string(),
        });
        Ok(())
    }

    fn delete_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        sha: &str,
        _message: &str,
    ) -> Result<()> {
        let mut state = self.state();
        state.check("delete_file")?;
        let head = state.next_commit();
        let target = state
            .repo_mut(repo)?
            .branches
            .get_mut(branch)
            .ok_or_else(|| not_found(format!("branch {} of {}", branch, repo)))?;
        let current = target
            .files
            .get(path)
            .ok_or_else(|| not_found(format!("{} in {}", path, repo)))?;
        if blob_sha(current) != sha {
            return Err(conflict("delete_file", "sha does not match"));
        }
        target.files.remove(path);
        target.head = head;
        state.mutations.push(Mutation::DeleteFile {
            repo: repo.to_string(),
            branch: branch.to_string(),
            path: path.to_string(),
        });
        Ok(())
    }

    fn put_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
        _message: &str,
    ) -> Result<()> {
        let mut state = self.state();
        state.check("put_file")?;
        let head = state.next_commit();
        let target = state
            .repo_mut(repo)?
            .branches
            .get_mut(branch)
            .ok_or_else(|| not_found(format!("branch {} of {}", branch, repo)))?;
        match (target.files.get(path), sha) {
            (Some(_), None) => return Err(conflict("put_file", "sha wasn't supplied")),
            (Some(current), Some(sha)) if blob_sha(current) != sha => {
                return Err(conflict("put_file", "sha does not match"))
            }
            _ => {}
        }
        target.files.insert(path.to_string(), content.to_vec());
        target.head = head;
        state.mutations.push(Mutation::PutFile {
            repo: repo.to_string(),
            branch: branch.to_string(),
            path: path.to_string(),
        });
        Ok(())
    }

    fn create_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        let mut state = self.state();
        state.check("create_pull_request")?;
        let target = state.repo_mut(repo)?;
        if !target.branches.contains_key(head) {
            return Err(Error::Remote {
                operation: "create_pull_request".to_string(),
                status: Some(422),
                message: format!("head branch {} does not exist", head),
            });
        }
        let number = target.next_number();
        target.pulls.push(PullRequest {
            head: head.to_string(),
            base: base.to_string(),
            title: title.to_string(),
            body: body.to_string(),
        });
        state.mutations.push(Mutation::CreatePullRequest {
            repo: repo.to_string(),
            head: head.to_string(),
            base: base.to_string(),
        });
        Ok(format!("https://github.com/{}/{}/pull/{}", self.owner, repo, number))
    }

    fn create_issue(&self, repo: &str, title: &str, body: &str) -> Result<String> {
        let mut state = self.state();
        state.check("create_issue")?;
        let target = state.repo_mut(repo)?;
        let number = target.next_number();
        target.issues.push(Issue {
            title: title.to_string(),
            body: body.to_string(),
        });
        state.mutations.push(Mutation::CreateIssue {
            repo: repo.to_string(),
            title: title.to_string(),
        });
        Ok(format!("https://github.com/{}/{}/issues/{}", self.owner, repo, number))
    }

    fn list_events(&self, repo: &str, since: DateTime<Utc>) -> Result<Vec<ActivityEvent>> {
        let state = self.state();
        state.check("list_events")?;
        Ok(prune_events(state.repo(repo)?.events.clone(), since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org() -> MemoryGithub {
        let github = MemoryGithub::new("acme");
        github.seed_repo("site");
        github
    }

    #[test]
    fn test_missing_team_is_not_found() {
        let github = org();
        assert!(github.get_team("docs-leader").unwrap_err().is_not_found());
        github.create_team("docs-leader", TeamPrivacy::Closed).unwrap();
        assert!(github.get_team("docs-leader").is_ok());
        assert_eq!(
            github.mutations(),
            vec![Mutation::CreateTeam {
                slug: "docs-leader".to_string()
            }]
        );
    }

    #[test]
    fn test_reads_are_not_recorded() {
        let github = org();
        github.seed_team("docs-leader");
        github.list_org_repos().unwrap();
        github.list_team_repos("docs-leader").unwrap();
        github.list_workflow_files("site").unwrap();
        assert!(github.mutations().is_empty());
    }

    #[test]
    fn test_put_file_requires_current_sha() {
        let github = org();
        github.seed_workflow("site", "lint.yml", b"old");
        let path = ".github/workflows/lint.yml";

        let err = github
            .put_file("site", "main", path, b"new", None, "update")
            .unwrap_err();
        assert!(matches!(err, Error::Remote { status: Some(409), .. }));

        let sha = blob_sha(b"old");
        github
            .put_file("site", "main", path, b"new", Some(&sha), "update")
            .unwrap();
        assert_eq!(github.file("site", "main", path).unwrap(), b"new");
    }

    #[test]
    fn test_branch_copies_files_from_head() {
        let github = org();
        github.seed_workflow("site", "lint.yml", b"lint");
        let head = github.branch_head("site", "main").unwrap();
        github.create_branch("site", "feature", &head).unwrap();
        assert_eq!(
            github.file("site", "feature", ".github/workflows/lint.yml").unwrap(),
            b"lint"
        );
        assert!(github.create_branch("site", "feature", &head).is_err());
    }

    #[test]
    fn test_pending_invitations_count_as_members() {
        let github = org();
        github.seed_contributor("site", "alice", 7);
        assert!(!github.list_org_members().unwrap().contains("alice"));
        github.invite_org_member(7).unwrap();
        assert!(github.list_org_members().unwrap().contains("alice"));
    }

    #[test]
    fn test_team_member_outside_org_is_invited() {
        let github = org();
        github.seed_org_member("alice");
        github.create_team("docs", TeamPrivacy::Closed).unwrap();

        github.add_team_member("docs", "alice").unwrap();
        github.add_team_member("docs", "zed").unwrap();
        assert_eq!(github.team_invitations("docs"), BTreeSet::from(["zed".to_string()]));
        assert_eq!(
            github.list_team_members("docs").unwrap(),
            BTreeSet::from(["alice".to_string(), "zed".to_string()])
        );

        github.remove_team_member("docs", "zed").unwrap();
        assert!(github.team_invitations("docs").is_empty());
        assert_eq!(github.mutations().len(), 4);
    }

    #[test]
    fn test_fail_on_injects_remote_error() {
        let github = org();
        github.fail_on("list_org_repos");
        let err = github.list_org_repos().unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("injected failure"));
    }
}
