//! # Configuration Resolution
//!
//! Turns pattern-keyed configuration into concrete per-repository state.
//!
//! ## Specificity
//!
//! Several `repos.toml` patterns may match one repository (`*` and
//! `go-service-*` both match `go-service-s3`). The longest pattern string
//! wins. This approximates "most specific" without analysing the globs
//! themselves.
//!
//! Patterns of equal length that match the same repository cannot be ordered
//! by that rule. Patterns are applied in (length, lexicographic) order and an
//! entry is only replaced by a strictly longer pattern, so among equal-length
//! patterns the lexicographically smallest one wins. Every such tie is
//! recorded as a [`PatternCollision`] and logged, and
//! [`Resolution::into_strict`] turns it into an error.

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::config::{ActionPolicy, RepoPolicies, TeamSpec};
use crate::error::{Error, Result};
use crate::pattern::Matcher;

/// A live repository paired with the policy that won for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRepo {
    pub name: String,
    pub projects: BTreeSet<String>,
    pub action: ActionPolicy,
    /// The `repos.toml` key this policy came from.
    pub source_pattern: String,
}

impl ResolvedRepo {
    pub fn source_pattern_len(&self) -> usize {
        self.source_pattern.len()
    }
}

/// Equal-length patterns that all match one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCollision {
    pub repo: String,
    /// The winning pattern first, then the ones it shadowed.
    pub patterns: Vec<String>,
}

/// Result of resolving `repos.toml` against the live repository list.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub repos: BTreeMap<String, ResolvedRepo>,
    pub collisions: Vec<PatternCollision>,
}

impl Resolution {
    /// Fails on the first equal-specificity collision.
    pub fn into_strict(self) -> Result<BTreeMap<String, ResolvedRepo>> {
        match self.collisions.into_iter().next() {
            Some(collision) => Err(Error::PatternCollision {
                repo: collision.repo,
                patterns: collision.patterns,
            }),
            None => Ok(self.repos),
        }
    }
}

/// Resolves every policy pattern against the live repository names.
///
/// Live repositories matched by no pattern get no entry.
pub fn resolve(policies: &RepoPolicies, live_repos: &[String]) -> Result<Resolution> {
    let mut ordered = policies
        .iter()
        .map(|(pattern, policy)| Ok((Matcher::compile(pattern)?, policy)))
        .collect::<Result<Vec<_>>>()?;
    ordered.sort_by(|(a, _), (b, _)| {
        a.as_str()
            .len()
            .cmp(&b.as_str().len())
            .then_with(|| a.as_str().cmp(b.as_str()))
    });

    let mut repos: BTreeMap<String, ResolvedRepo> = BTreeMap::new();
    let mut ties: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for (matcher, policy) in &ordered {
        let pattern = matcher.as_str();
        for name in live_repos {
            if !matcher.matches(name) {
                continue;
            }

            let replace = match repos.get(name) {
                None => true,
                Some(current) if current.source_pattern_len() < pattern.len() => {
                    ties.remove(name);
                    true
                }
                Some(current) if current.source_pattern_len() == pattern.len() => {
                    ties.entry(name.clone())
                        .or_insert_with(|| vec![current.source_pattern.clone()])
                        .push(pattern.to_string());
                    false
                }
                Some(_) => false,
            };

            if replace {
                repos.insert(
                    name.clone(),
                    ResolvedRepo {
                        name: name.clone(),
                        projects: policy.projects.clone(),
                        action: policy.action.clone(),
                        source_pattern: pattern.to_string(),
                    },
                );
            }
        }
    }

    let collisions: Vec<PatternCollision> = ties
        .into_iter()
        .map(|(repo, patterns)| {
            warn!(
                "patterns {} have equal specificity for {}, using '{}'",
                patterns.join(", "),
                repo,
                patterns[0]
            );
            PatternCollision { repo, patterns }
        })
        .collect();

    Ok(Resolution { repos, collisions })
}

/// Groups resolved repositories by project.
pub fn project_index(repos: &BTreeMap<String, ResolvedRepo>) -> BTreeMap<String, BTreeSet<String>> {
    let mut index: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for repo in repos.values() {
        for project in &repo.projects {
            index
                .entry(project.clone())
                .or_default()
                .insert(repo.name.clone());
        }
    }
    index
}

/// The repositories a team should have access to.
///
/// Explicit entries are expanded as globs against the live repositories; the
/// team's project contributes every repository in that project.
pub fn desired_repos(
    team: &TeamSpec,
    live_repos: &[String],
    projects: &BTreeMap<String, BTreeSet<String>>,
) -> Result<BTreeSet<String>> {
    let mut desired = BTreeSet::new();

    for pattern in &team.repos {
        let matched = Matcher::compile(pattern)?.expand(live_repos);
        if matched.is_empty() {
            warn!("team {}: '{}' matches no repository", team.slug, pattern);
        }
        desired.extend(matched);
    }

    if let Some(project) = &team.project {
        match projects.get(project) {
            Some(repos) => desired.extend(repos.iter().cloned()),
            None => warn!("team {}: project '{}' has no repository", team.slug, project),
        }
    }

    Ok(desired)
}
