//! Workflow file reconciliation.
//!
//! Each tracked repository's `.github/workflows` directory is brought in line
//! with its resolved [`ActionPolicy`]:
//!
//! - *allowed* workflows are left alone,
//! - *required* workflows must match the local reference file
//!   `<actions_dir>/<name>.yml` byte for byte,
//! - anything else is removed.
//!
//! Changes are never pushed to the default branch. They are committed one
//! file at a time to a fresh branch and proposed through a pull request.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::config::ActionPolicy;
use crate::error::{Error, Result};
use crate::github::{GithubOperations, WorkflowFile};
use crate::resolve::ResolvedRepo;

const WORKFLOW_DIR: &str = ".github/workflows";
const PULL_REQUEST_TITLE: &str = "ci: Sync GitHub Actions workflows";

/// How the policy treats an existing workflow file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Allowed,
    Required,
    Other,
}

/// Classifies a workflow by action name. Allowed takes precedence.
pub fn classify(policy: &ActionPolicy, action: &str) -> FileClass {
    if policy.is_allowed(action) {
        FileClass::Allowed
    } else if policy.is_required(action) {
        FileClass::Required
    } else {
        FileClass::Other
    }
}

/// A workflow file to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRemoval {
    pub path: String,
    pub sha: String,
}

/// A workflow file to create (`sha` is `None`) or overwrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub sha: Option<String>,
    pub content: Vec<u8>,
}

/// Staged workflow changes for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionsPlan {
    pub repo: String,
    pub removals: Vec<FileRemoval>,
    pub writes: Vec<FileWrite>,
}

impl ActionsPlan {
    fn new(repo: &str) -> Self {
        Self {
            repo: repo.to_string(),
            removals: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// True when the repository has converged.
    pub fn is_empty(&self) -> bool {
        self.removals.is_empty() && self.writes.is_empty()
    }
}

impl fmt::Display for ActionsPlan {
    /// One Markdown bullet per staged file.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for removal in &self.removals {
            writeln!(f, "- remove `{}`", removal.path)?;
        }
        for write in &self.writes {
            let verb = if write.sha.is_some() { "update" } else { "add" };
            writeln!(f, "- {} `{}`", verb, write.path)?;
        }
        Ok(())
    }
}

/// Name of the branch a sync started at `now` commits to.
pub fn sync_branch_name(now: DateTime<Utc>) -> String {
    format!("community/sync-actions-{}", now.timestamp())
}

/// Reconciles workflow files against reference files in `actions_dir`.
pub struct ActionSync<'a> {
    ops: &'a dyn GithubOperations,
    actions_dir: PathBuf,
}

impl<'a> ActionSync<'a> {
    pub fn new(ops: &'a dyn GithubOperations, actions_dir: impl Into<PathBuf>) -> Self {
        Self {
            ops,
            actions_dir: actions_dir.into(),
        }
    }

    pub fn actions_dir(&self) -> &Path {
        &self.actions_dir
    }

    /// Reads the reference content of a required action.
    pub fn reference(&self, action: &str) -> Result<Vec<u8>> {
        let path = self.actions_dir.join(format!("{}.yml", action));
        std::fs::read(&path).map_err(|source| Error::LocalIo { path, source })
    }

    /// Stages the changes one repository needs.
    ///
    /// A repository without required actions is skipped without reading its
    /// workflow directory.
    pub fn plan(&self, repo: &ResolvedRepo) -> Result<ActionsPlan> {
        let mut plan = ActionsPlan::new(&repo.name);
        if repo.action.required.is_empty() {
            debug!("{} requires no actions, skipping", repo.name);
            return Ok(plan);
        }

        let files: Vec<WorkflowFile> = self.ops.list_workflow_files(&repo.name)?;
        let mut missing: BTreeSet<String> = repo.action.required.clone();

        for file in files {
            let action = file.action_name().to_string();
            match classify(&repo.action, &action) {
                FileClass::Allowed => {
                    missing.remove(&action);
                }
                FileClass::Required => {
                    missing.remove(&action);
                    let reference = self.reference(&action)?;
                    if reference != file.content {
                        plan.writes.push(FileWrite {
                            path: file.path,
                            sha: Some(file.sha),
                            content: reference,
                        });
                    }
                }
                FileClass::Other => plan.removals.push(FileRemoval {
                    path: file.path,
                    sha: file.sha,
                }),
            }
        }

        for action in missing {
            plan.writes.push(FileWrite {
                path: format!("{}/{}.yml", WORKFLOW_DIR, action),
                sha: None,
                content: self.reference(&action)?,
            });
        }

        Ok(plan)
    }

    /// Commits a plan to a new branch and opens a pull request.
    ///
    /// Returns the pull request URL, or `None` for an empty plan. A failure
    /// leaves any branch already created in place.
    pub fn apply(&self, plan: &ActionsPlan, now: DateTime<Utc>) -> Result<Option<String>> {
        if plan.is_empty() {
            return Ok(None);
        }

        let repo = plan.repo.as_str();
        let base = self.ops.default_branch(repo)?;
        let head = self.ops.branch_head(repo, &base)?;
        let branch = sync_branch_name(now);
        self.ops.create_branch(repo, &branch, &head)?;
        info!("created branch {} in {}", branch, repo);

        for removal in &plan.removals {
            let message = format!("ci: Remove {}", removal.path);
            self.ops
                .delete_file(repo, &branch, &removal.path, &removal.sha, &message)?;
            info!("removed {} in {}", removal.path, repo);
        }
        for write in &plan.writes {
            let message = match write.sha {
                Some(_) => format!("ci: Update {}", write.path),
                None => format!("ci: Add {}", write.path),
            };
            self.ops.put_file(
                repo,
                &branch,
                &write.path,
                &write.content,
                write.sha.as_deref(),
                &message,
            )?;
            info!("wrote {} in {}", write.path, repo);
        }

        let body = format!(
            "Sync workflow files with the reference actions.\n\n{}",
            plan
        );
        let url = self
            .ops
            .create_pull_request(repo, &branch, &base, PULL_REQUEST_TITLE, &body)?;
        info!("opened {}", url);
        Ok(Some(url))
    }

    /// Plans and applies one repository.
    pub fn sync_repo(&self, repo: &ResolvedRepo, now: DateTime<Utc>) -> Result<Option<String>> {
        let plan = self.plan(repo)?;
        self.apply(&plan, now)
    }

    /// Converges every repository in order, stopping at the first error.
    ///
    /// Returns the opened pull requests as `(repo, url)`.
    pub fn sync_actions<'r, I>(&self, repos: I, now: DateTime<Utc>) -> Result<Vec<(String, String)>>
    where
        I: IntoIterator<Item = &'r ResolvedRepo>,
    {
        let mut opened = Vec::new();
        for repo in repos {
            if let Some(url) = self.sync_repo(repo, now)? {
                opened.push((repo.name.clone(), url));
            }
        }
        Ok(opened)
    }
}
