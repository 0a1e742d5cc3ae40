//! # Remote State Access
//!
//! This module defines [`GithubOperations`], the only way the reconciliation
//! engine talks to GitHub, together with the typed records it returns.
//!
//! ## Design
//!
//! The trait separates *what* the engine needs from *how* it is fetched, the
//! same way the clone and cache layers sit behind traits elsewhere in the
//! ecosystem:
//!
//! - **`client::GithubClient`**: the blocking REST implementation. It hides
//!   pagination behind an iterator, so every list operation below returns one
//!   complete, deduplicated collection.
//! - **`memory::MemoryGithub`**: an in-memory organization that records every
//!   mutating call. Tests and benchmarks use it to run the real engine without
//!   network access.
//!
//! ## Contract
//!
//! - List operations page until exhaustion.
//! - `list_org_repos` never filters archived repositories, it only logs them.
//! - `list_team_members` and `list_org_members` include pending invitations.
//! - `list_events` returns only public issue and pull-request events created
//!   at or after `since`, oldest first. Other event types never leave the
//!   accessor.
//! - A missing resource is reported as [`Error::RemoteNotFound`]; every other
//!   failure as [`Error::Remote`].
//!
//! [`Error::RemoteNotFound`]: crate::error::Error::RemoteNotFound
//! [`Error::Remote`]: crate::error::Error::Remote

pub mod client;
pub mod memory;
mod wire;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::error::Result;

/// Automation accounts excluded from org invitations and report authorship.
pub const BOT_LOGINS: &[&str] = &[
    "dependabot[bot]",
    "dependabot-preview[bot]",
    "github-actions[bot]",
    "codecov[bot]",
    "renovate[bot]",
    "mergify[bot]",
    "stale[bot]",
    "BeyondRobot",
];

/// Exact-match check against [`BOT_LOGINS`].
pub fn is_bot(login: &str) -> bool {
    BOT_LOGINS.contains(&login)
}

/// Privacy of a newly created team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamPrivacy {
    /// Visible to every organization member.
    Closed,
}

impl TeamPrivacy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamPrivacy::Closed => "closed",
        }
    }
}

/// A file under `.github/workflows`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowFile {
    /// File name, e.g. `lint.yml`.
    pub name: String,
    /// Path from the repository root.
    pub path: String,
    /// Blob sha, required to update or delete the file.
    pub sha: String,
    pub content: Vec<u8>,
}

impl WorkflowFile {
    /// The action name: the file name with a `.yml` suffix stripped.
    pub fn action_name(&self) -> &str {
        self.name.strip_suffix(".yml").unwrap_or(&self.name)
    }
}

/// What happened to an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Opened,
    Closed,
    /// Any action the report does not count (reopened, labeled, ...).
    Other(String),
}

impl From<&str> for EventAction {
    fn from(action: &str) -> Self {
        match action {
            "opened" => EventAction::Opened,
            "closed" => EventAction::Closed,
            other => EventAction::Other(other.to_string()),
        }
    }
}

/// Fields shared by every activity event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetails {
    pub actor: String,
    pub action: EventAction,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub public: bool,
}

/// One entry of a repository's activity stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityEvent {
    Issue(EventDetails),
    PullRequest { details: EventDetails, merged: bool },
}

impl ActivityEvent {
    pub fn details(&self) -> &EventDetails {
        match self {
            ActivityEvent::Issue(details) => details,
            ActivityEvent::PullRequest { details, .. } => details,
        }
    }

    pub fn actor(&self) -> &str {
        &self.details().actor
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.details().created_at
    }
}

/// Keeps public events created at or after `since`, oldest first.
///
/// The sort is stable: events with the same timestamp keep the order in
/// which they were discovered.
pub fn prune_events(mut events: Vec<ActivityEvent>, since: DateTime<Utc>) -> Vec<ActivityEvent> {
    events.retain(|event| event.details().public && event.created_at() >= since);
    events.sort_by_key(|event| event.created_at());
    events
}

/// Everything the reconciliation engine needs from GitHub.
///
/// All calls are blocking. Implementations are scoped to one organization.
pub trait GithubOperations: Send + Sync {
    /// The organization every call operates on.
    fn owner(&self) -> &str;

    /// Names of every repository in the organization.
    fn list_org_repos(&self) -> Result<Vec<String>>;

    /// `Ok` if the team exists, `Error::RemoteNotFound` if it does not.
    fn get_team(&self, slug: &str) -> Result<()>;

    fn create_team(&self, slug: &str, privacy: TeamPrivacy) -> Result<()>;

    fn list_team_repos(&self, slug: &str) -> Result<BTreeSet<String>>;

    /// Grants `repo` to the team with the given GitHub permission.
    fn add_team_repo(&self, slug: &str, repo: &str, permission: &str) -> Result<()>;

    fn remove_team_repo(&self, slug: &str, repo: &str) -> Result<()>;

    /// Current members plus pending invitations.
    fn list_team_members(&self, slug: &str) -> Result<BTreeSet<String>>;

    fn add_team_member(&self, slug: &str, login: &str) -> Result<()>;

    fn remove_team_member(&self, slug: &str, login: &str) -> Result<()>;

    /// Organization members plus pending invitations.
    fn list_org_members(&self) -> Result<BTreeSet<String>>;

    /// Invites a user to the organization by account id.
    fn invite_org_member(&self, user_id: u64) -> Result<()>;

    /// Contributor login to account id.
    fn list_contributors(&self, repo: &str) -> Result<BTreeMap<String, u64>>;

    /// Files under `.github/workflows`; empty if the directory is missing.
    fn list_workflow_files(&self, repo: &str) -> Result<Vec<WorkflowFile>>;

    fn default_branch(&self, repo: &str) -> Result<String>;

    /// Commit sha the branch points at.
    fn branch_head(&self, repo: &str, branch: &str) -> Result<String>;

    fn create_branch(&self, repo: &str, branch: &str, sha: &str) -> Result<()>;

    fn delete_file(&self, repo: &str, branch: &str, path: &str, sha: &str, message: &str)
        -> Result<()>;

    /// Creates the file, or updates it when `sha` names the current blob.
    fn put_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
        message: &str,
    ) -> Result<()>;

    /// Opens a pull request and returns its URL.
    fn create_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String>;

    /// Opens an issue and returns its URL.
    fn create_issue(&self, repo: &str, title: &str, body: &str) -> Result<String>;

    /// Public issue and pull-request events at or after `since`, oldest first.
    fn list_events(&self, repo: &str, since: DateTime<Utc>) -> Result<Vec<ActivityEvent>>;
}
