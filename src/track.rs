//! Tracking issues opened across many repositories at once.

use log::info;

use crate::error::Result;
use crate::github::GithubOperations;
use crate::pattern::Matcher;

/// Repositories a tracking issue would be opened in, in input order.
pub fn tracked_repos(pattern: &str, live_repos: &[String]) -> Result<Vec<String>> {
    Ok(Matcher::compile(pattern)?.expand(live_repos))
}

/// Opens the same issue in each of `repos`, typically the result of
/// [`tracked_repos`].
///
/// Returns `(repo, url)` per created issue. Stops at the first failure;
/// issues already created stay open.
pub fn create_tracking_issues(
    ops: &dyn GithubOperations,
    repos: &[String],
    title: &str,
    body: &str,
) -> Result<Vec<(String, String)>> {
    let mut created = Vec::new();
    for repo in repos {
        let url = ops.create_issue(repo, title, body)?;
        info!("opened tracking issue {}", url);
        created.push((repo.clone(), url));
    }
    Ok(created)
}
