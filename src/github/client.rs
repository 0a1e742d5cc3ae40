//! Blocking GitHub REST client.
//!
//! Every request carries the bearer token (when one is configured), the v3
//! media type and a fixed API version. List endpoints are consumed through
//! [`Pages`], which follows `Link: <...>; rel="next"` headers until the last
//! page, so callers never see pagination.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use super::wire::{
    Account, ContentEntry, Created, FileContent, GitRef, Invitation, RawEvent, Repository,
};
use super::{prune_events, ActivityEvent, GithubOperations, TeamPrivacy, WorkflowFile};
use crate::error::{Error, Result};

const ACCEPT: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const PER_PAGE: u32 = 100;
const TIMEOUT: Duration = Duration::from_secs(30);
const WORKFLOW_DIR: &str = ".github/workflows";

/// GitHub error bodies look like `{"message": "Not Found", ...}`.
#[derive(Deserialize)]
struct ApiMessage {
    message: String,
}

fn map_error(operation: &str, error: ureq::Error) -> Error {
    match error {
        ureq::Error::Status(404, _) => Error::RemoteNotFound {
            resource: operation.to_string(),
        },
        ureq::Error::Status(status, response) => {
            let body = response.into_string().unwrap_or_default();
            let message = serde_json::from_str::<ApiMessage>(&body)
                .map(|m| m.message)
                .unwrap_or(body);
            Error::Remote {
                operation: operation.to_string(),
                status: Some(status),
                message,
            }
        }
        ureq::Error::Transport(transport) => Error::remote(operation, transport.to_string()),
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let target = pieces.next()?.trim();
        let is_next = pieces.any(|p| p.trim() == "rel=\"next\"");
        if is_next && target.starts_with('<') && target.ends_with('>') {
            Some(target[1..target.len() - 1].to_string())
        } else {
            None
        }
    })
}

fn with_page_size(url: String) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}per_page={}", url, separator, PER_PAGE)
}

/// A GitHub organization reached over HTTPS.
pub struct GithubClient {
    agent: ureq::Agent,
    api_url: String,
    owner: String,
    token: Option<String>,
}

impl GithubClient {
    /// Creates a client for `owner`. An empty token sends anonymous requests.
    pub fn new(api_url: impl Into<String>, owner: impl Into<String>, token: impl Into<String>) -> Self {
        let token = token.into();
        let agent = ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .user_agent(concat!("community-sync/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            token: if token.is_empty() { None } else { Some(token) },
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn call(
        &self,
        operation: &str,
        method: &str,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ureq::Response> {
        debug!("{} {}", method, url);
        let mut request = self
            .agent
            .request(method, url)
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("Bearer {}", token));
        }

        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        result.map_err(|e| map_error(operation, e))
    }

    fn get<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Result<T> {
        self.call(operation, "GET", &self.url(path), None)?
            .into_json()
            .map_err(|e| Error::Decode {
                message: format!("{}: {}", operation, e),
            })
    }

    fn send<T: DeserializeOwned>(
        &self,
        operation: &str,
        method: &str,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.call(operation, method, &self.url(path), Some(&body))?
            .into_json()
            .map_err(|e| Error::Decode {
                message: format!("{}: {}", operation, e),
            })
    }

    fn send_empty(
        &self,
        operation: &str,
        method: &str,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<()> {
        self.call(operation, method, &self.url(path), body.as_ref())?;
        Ok(())
    }

    /// Lazily iterates every item of a paginated list endpoint.
    pub fn pages<T: DeserializeOwned>(&self, operation: &str, path: &str) -> Pages<'_, T> {
        Pages {
            client: self,
            operation: operation.to_string(),
            next: Some(with_page_size(self.url(path))),
            buffer: Vec::new().into_iter(),
        }
    }

    fn collect_names<T, F>(&self, operation: &str, path: &str, name: F) -> Result<BTreeSet<String>>
    where
        T: DeserializeOwned,
        F: Fn(T) -> Option<String>,
    {
        let mut names = BTreeSet::new();
        for item in self.pages::<T>(operation, path) {
            names.extend(name(item?));
        }
        Ok(names)
    }
}

/// Page-by-page iterator over a list endpoint.
///
/// The next page is only requested once the current one is drained. A failed
/// request is yielded once and ends the iteration.
pub struct Pages<'a, T> {
    client: &'a GithubClient,
    operation: String,
    next: Option<String>,
    buffer: std::vec::IntoIter<T>,
}

impl<T: DeserializeOwned> Pages<'_, T> {
    fn fetch(&mut self, url: &str) -> Result<Vec<T>> {
        let response = self.client.call(&self.operation, "GET", url, None)?;
        self.next = response.header("link").and_then(next_link);
        // Contributors of an empty repository come back as 204.
        if response.status() == 204 {
            return Ok(Vec::new());
        }
        response.into_json().map_err(|e| Error::Decode {
            message: format!("{}: {}", self.operation, e),
        })
    }
}

impl<T: DeserializeOwned> Iterator for Pages<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.next() {
                return Some(Ok(item));
            }
            let url = self.next.take()?;
            match self.fetch(&url) {
                Ok(items) => self.buffer = items.into_iter(),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

impl GithubOperations for GithubClient {
    fn owner(&self) -> &str {
        &self.owner
    }

    fn list_org_repos(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let path = format!("/orgs/{}/repos", self.owner);
        for repo in self.pages::<Repository>("list repositories", &path) {
            let repo = repo?;
            if repo.archived {
                info!("repository {} is archived", repo.name);
            }
            names.push(repo.name);
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn get_team(&self, slug: &str) -> Result<()> {
        let path = format!("/orgs/{}/teams/{}", self.owner, slug);
        let _: serde_json::Value = self.get(&format!("get team {}", slug), &path)?;
        Ok(())
    }

    fn create_team(&self, slug: &str, privacy: TeamPrivacy) -> Result<()> {
        let path = format!("/orgs/{}/teams", self.owner);
        let body = json!({ "name": slug, "privacy": privacy.as_str() });
        self.send_empty(&format!("create team {}", slug), "POST", &path, Some(body))
    }

    fn list_team_repos(&self, slug: &str) -> Result<BTreeSet<String>> {
        let path = format!("/orgs/{}/teams/{}/repos", self.owner, slug);
        self.collect_names(&format!("list repositories of team {}", slug), &path, |r: Repository| {
            Some(r.name)
        })
    }

    fn add_team_repo(&self, slug: &str, repo: &str, permission: &str) -> Result<()> {
        let path = format!(
            "/orgs/{owner}/teams/{}/repos/{owner}/{}",
            slug,
            repo,
            owner = self.owner
        );
        let body = json!({ "permission": permission });
        self.send_empty(&format!("grant {} to team {}", repo, slug), "PUT", &path, Some(body))
    }

    fn remove_team_repo(&self, slug: &str, repo: &str) -> Result<()> {
        let path = format!(
            "/orgs/{owner}/teams/{}/repos/{owner}/{}",
            slug,
            repo,
            owner = self.owner
        );
        self.send_empty(&format!("revoke {} from team {}", repo, slug), "DELETE", &path, None)
    }

    fn list_team_members(&self, slug: &str) -> Result<BTreeSet<String>> {
        let operation = format!("list members of team {}", slug);
        let members_path = format!("/orgs/{}/teams/{}/members", self.owner, slug);
        let invitations_path = format!("/orgs/{}/teams/{}/invitations", self.owner, slug);

        let mut members = self.collect_names(&operation, &members_path, |a: Account| Some(a.login))?;
        members.extend(self.collect_names(&operation, &invitations_path, |i: Invitation| i.login)?);
        Ok(members)
    }

    fn add_team_member(&self, slug: &str, login: &str) -> Result<()> {
        let path = format!("/orgs/{}/teams/{}/memberships/{}", self.owner, slug, login);
        let body = json!({ "role": "member" });
        self.send_empty(&format!("add {} to team {}", login, slug), "PUT", &path, Some(body))
    }

    fn remove_team_member(&self, slug: &str, login: &str) -> Result<()> {
        let path = format!("/orgs/{}/teams/{}/memberships/{}", self.owner, slug, login);
        self.send_empty(&format!("remove {} from team {}", login, slug), "DELETE", &path, None)
    }

    fn list_org_members(&self) -> Result<BTreeSet<String>> {
        let operation = "list organization members";
        let members_path = format!("/orgs/{}/members", self.owner);
        let invitations_path = format!("/orgs/{}/invitations", self.owner);

        let mut members = self.collect_names(operation, &members_path, |a: Account| Some(a.login))?;
        members.extend(self.collect_names(operation, &invitations_path, |i: Invitation| i.login)?);
        Ok(members)
    }

    fn invite_org_member(&self, user_id: u64) -> Result<()> {
        let path = format!("/orgs/{}/invitations", self.owner);
        let body = json!({ "invitee_id": user_id, "role": "direct_member" });
        self.send_empty(&format!("invite user {}", user_id), "POST", &path, Some(body))
    }

    fn list_contributors(&self, repo: &str) -> Result<BTreeMap<String, u64>> {
        let path = format!("/repos/{}/{}/contributors", self.owner, repo);
        self.pages::<Account>(&format!("list contributors of {}", repo), &path)
            .map(|account| account.map(|a| (a.login, a.id)))
            .collect()
    }

    fn list_workflow_files(&self, repo: &str) -> Result<Vec<WorkflowFile>> {
        let operation = format!("list workflows of {}", repo);
        let path = format!("/repos/{}/{}/contents/{}", self.owner, repo, WORKFLOW_DIR);
        let entries: Vec<ContentEntry> = match self.get(&operation, &path) {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries.into_iter().filter(|e| e.kind == "file") {
            let file_path = format!("/repos/{}/{}/contents/{}", self.owner, repo, entry.path);
            let file: FileContent = self.get(&format!("read {} in {}", entry.path, repo), &file_path)?;
            files.push(WorkflowFile {
                content: file.decode()?,
                name: entry.name,
                path: entry.path,
                sha: entry.sha,
            });
        }
        Ok(files)
    }

    fn default_branch(&self, repo: &str) -> Result<String> {
        let path = format!("/repos/{}/{}", self.owner, repo);
        let repository: Repository = self.get(&format!("get repository {}", repo), &path)?;
        repository.default_branch.ok_or_else(|| Error::Decode {
            message: format!("repository {} has no default branch", repo),
        })
    }

    fn branch_head(&self, repo: &str, branch: &str) -> Result<String> {
        let path = format!("/repos/{}/{}/git/ref/heads/{}", self.owner, repo, branch);
        let git_ref: GitRef = self.get(&format!("read branch {} of {}", branch, repo), &path)?;
        Ok(git_ref.object.sha)
    }

    fn create_branch(&self, repo: &str, branch: &str, sha: &str) -> Result<()> {
        let path = format!("/repos/{}/{}/git/refs", self.owner, repo);
        let body = json!({ "ref": format!("refs/heads/{}", branch), "sha": sha });
        self.send_empty(&format!("create branch {} in {}", branch, repo), "POST", &path, Some(body))
    }

    fn delete_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        sha: &str,
        message: &str,
    ) -> Result<()> {
        let url_path = format!("/repos/{}/{}/contents/{}", self.owner, repo, path);
        let body = json!({ "message": message, "sha": sha, "branch": branch });
        self.send_empty(&format!("delete {} in {}", path, repo), "DELETE", &url_path, Some(body))
    }

    fn put_file(
        &self,
        repo: &str,
        branch: &str,
        path: &str,
        content: &[u8],
        sha: Option<&str>,
        message: &str,
    ) -> Result<()> {
        let url_path = format!("/repos/{}/{}/contents/{}", self.owner, repo, path);
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }
        self.send_empty(&format!("write {} in {}", path, repo), "PUT", &url_path, Some(body))
    }

    fn create_pull_request(
        &self,
        repo: &str,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<String> {
        let path = format!("/repos/{}/{}/pulls", self.owner, repo);
        let payload = json!({ "title": title, "head": head, "base": base, "body": body });
        let created: Created = self.send(&format!("open pull request in {}", repo), "POST", &path, payload)?;
        Ok(created.html_url)
    }

    fn create_issue(&self, repo: &str, title: &str, body: &str) -> Result<String> {
        let path = format!("/repos/{}/{}/issues", self.owner, repo);
        let payload = json!({ "title": title, "body": body });
        let created: Created = self.send(&format!("open issue in {}", repo), "POST", &path, payload)?;
        Ok(created.html_url)
    }

    fn list_events(&self, repo: &str, since: DateTime<Utc>) -> Result<Vec<ActivityEvent>> {
        let path = format!("/repos/{}/{}/events", self.owner, repo);
        let mut events = Vec::new();
        for raw in self.pages::<RawEvent>(&format!("list events of {}", repo), &path) {
            let raw = raw?;
            // Newest first: everything after this is outside the window.
            if raw.created_at < since {
                break;
            }
            if let Some(event) = raw.into_activity()? {
                events.push(event);
            }
        }
        Ok(prune_events(events, since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_link_found() {
        let header = r#"<https://api.github.com/orgs/o/repos?page=2>; rel="next", <https://api.github.com/orgs/o/repos?page=5>; rel="last""#;
        assert_eq!(
            next_link(header).as_deref(),
            Some("https://api.github.com/orgs/o/repos?page=2")
        );
    }

    #[test]
    fn test_next_link_absent_on_last_page() {
        let header = r#"<https://api.github.com/orgs/o/repos?page=1>; rel="first", <https://api.github.com/orgs/o/repos?page=4>; rel="prev""#;
        assert_eq!(next_link(header), None);
        assert_eq!(next_link(""), None);
    }

    #[test]
    fn test_with_page_size() {
        assert_eq!(
            with_page_size("https://x/orgs/o/repos".to_string()),
            "https://x/orgs/o/repos?per_page=100"
        );
        assert_eq!(
            with_page_size("https://x/search?q=a".to_string()),
            "https://x/search?q=a&per_page=100"
        );
    }

    #[test]
    fn test_map_error_not_found() {
        let response = ureq::Response::new(404, "Not Found", r#"{"message":"Not Found"}"#).unwrap();
        let error = map_error("get team docs-leader", ureq::Error::Status(404, response));
        assert!(error.is_not_found());
        assert!(error.to_string().contains("docs-leader"));
    }

    #[test]
    fn test_map_error_uses_api_message() {
        let response =
            ureq::Response::new(422, "Unprocessable Entity", r#"{"message":"Validation Failed"}"#)
                .unwrap();
        match map_error("create team x", ureq::Error::Status(422, response)) {
            Error::Remote {
                status, message, ..
            } => {
                assert_eq!(status, Some(422));
                assert_eq!(message, "Validation Failed");
            }
            other => panic!("Expected Remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = GithubClient::new("https://ghe.example.com/api/v3/", "org", "");
        assert_eq!(client.url("/orgs/org"), "https://ghe.example.com/api/v3/orgs/org");
        assert_eq!(client.owner(), "org");
        assert!(client.token.is_none());
    }
}
