//! Reconciliation of remote state against the configuration.
//!
//! ## Overview
//!
//! Every reconciler follows the same two steps:
//! 1. Plan - read existing state through [`GithubOperations`] and diff it
//!    against the desired state. Plans are plain data and issue no mutating
//!    call, which is what `--dry-run` prints.
//! 2. Apply - issue the mutating calls a plan describes, logging each one.
//!
//! The reconcilers:
//! - [`teams`] - team bootstrap, repository grants and membership
//! - [`contributors`] - organization invitations for outside contributors
//! - [`actions`] - workflow files, staged through a branch and pull request
//!
//! Applying a plan a second time against unchanged state plans nothing.
//! Nothing is rolled back when a call fails halfway through a plan.
//!
//! [`GithubOperations`]: crate::github::GithubOperations

use std::collections::{BTreeMap, BTreeSet};

use crate::config::Role;

pub mod actions;
pub mod contributors;
pub mod teams;

/// Set difference between what exists and what should exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff<T: Ord> {
    /// `desired - existing`
    pub to_add: BTreeSet<T>,
    /// `existing - desired`
    pub to_remove: BTreeSet<T>,
}

impl<T: Ord> Default for Diff<T> {
    fn default() -> Self {
        Self {
            to_add: BTreeSet::new(),
            to_remove: BTreeSet::new(),
        }
    }
}

impl<T: Ord + Clone> Diff<T> {
    pub fn compute(existing: &BTreeSet<T>, desired: &BTreeSet<T>) -> Self {
        Self {
            to_add: desired.difference(existing).cloned().collect(),
            to_remove: existing.difference(desired).cloned().collect(),
        }
    }
}

impl Diff<String> {
    /// Diffs GitHub logins, which are case-insensitive.
    ///
    /// Additions keep the desired spelling and removals keep the existing
    /// one, so each call names the login the way its side knows it.
    pub fn compute_logins(existing: &BTreeSet<String>, desired: &BTreeSet<String>) -> Self {
        let folded = |logins: &BTreeSet<String>| -> BTreeSet<String> {
            logins.iter().map(|login| login.to_lowercase()).collect()
        };
        let existing_folded = folded(existing);
        let desired_folded = folded(desired);
        Self {
            to_add: desired
                .iter()
                .filter(|login| !existing_folded.contains(&login.to_lowercase()))
                .cloned()
                .collect(),
            to_remove: existing
                .iter()
                .filter(|login| !desired_folded.contains(&login.to_lowercase()))
                .cloned()
                .collect(),
        }
    }
}

impl<T: Ord> Diff<T> {
    /// True when existing and desired state already agree.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Number of mutating calls applying this diff takes.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Maps each [`Role`] to the GitHub repository permission its teams get.
///
/// Built once and never modified; reconcilers receive it by value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionTable {
    permissions: BTreeMap<Role, String>,
}

impl Default for PermissionTable {
    fn default() -> Self {
        let permissions = [
            (Role::Leader, "admin"),
            (Role::Maintainer, "maintain"),
            (Role::Committer, "push"),
            (Role::Reviewer, "triage"),
            (Role::Contributor, "pull"),
        ]
        .into_iter()
        .map(|(role, permission)| (role, permission.to_string()))
        .collect();
        Self { permissions }
    }
}

impl PermissionTable {
    /// Returns a table with one role mapped differently.
    pub fn with_permission(mut self, role: Role, permission: impl Into<String>) -> Self {
        self.permissions.insert(role, permission.into());
        self
    }

    pub fn permission(&self, role: Role) -> &str {
        self.permissions
            .get(&role)
            .map(String::as_str)
            .unwrap_or("pull")
    }
}
