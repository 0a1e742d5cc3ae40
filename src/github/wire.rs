//! JSON shapes of the GitHub REST responses this crate reads.
//!
//! Only the fields the accessor uses are declared; serde ignores the rest.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{ActivityEvent, EventAction, EventDetails};
use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
pub(crate) struct Repository {
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Account {
    pub login: String,
    pub id: u64,
}

/// A pending invitation; email-only invitations carry no login.
#[derive(Debug, Deserialize)]
pub(crate) struct Invitation {
    #[serde(default)]
    pub login: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentEntry {
    pub name: String,
    pub path: String,
    pub sha: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FileContent {
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl FileContent {
    /// GitHub wraps base64 content at 60 columns.
    pub fn decode(&self) -> Result<Vec<u8>> {
        match self.encoding.as_deref() {
            Some("base64") | None => {
                let compact: String = self
                    .content
                    .chars()
                    .filter(|c| !c.is_ascii_whitespace())
                    .collect();
                STANDARD.decode(compact).map_err(|e| Error::Decode {
                    message: e.to_string(),
                })
            }
            Some(other) => Err(Error::Decode {
                message: format!("unsupported content encoding '{}'", other),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitObject {
    pub sha: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitRef {
    pub object: GitObject,
}

/// Response of the issue and pull-request creation endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Created {
    pub html_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Actor {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEvent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub actor: Actor,
    #[serde(default)]
    pub public: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: String,
    html_url: String,
    #[serde(default)]
    merged: bool,
}

#[derive(Debug, Deserialize)]
struct IssuePayload {
    action: String,
    issue: Item,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    action: String,
    pull_request: Item,
}

impl RawEvent {
    /// Converts issue and pull-request events; every other type yields `None`.
    pub fn into_activity(self) -> Result<Option<ActivityEvent>> {
        let details = |action: &str, item: &Item| EventDetails {
            actor: self.actor.login.clone(),
            action: EventAction::from(action),
            created_at: self.created_at,
            title: item.title.clone(),
            url: item.html_url.clone(),
            public: self.public,
        };

        match self.kind.as_deref() {
            Some("IssuesEvent") => {
                let payload: IssuePayload = serde_json::from_value(self.payload.clone())?;
                Ok(Some(ActivityEvent::Issue(details(
                    &payload.action,
                    &payload.issue,
                ))))
            }
            Some("PullRequestEvent") => {
                let payload: PullRequestPayload = serde_json::from_value(self.payload.clone())?;
                Ok(Some(ActivityEvent::PullRequest {
                    details: details(&payload.action, &payload.pull_request),
                    merged: payload.pull_request.merged,
                }))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(kind: &str, payload: serde_json::Value) -> RawEvent {
        serde_json::from_value(json!({
            "type": kind,
            "actor": { "login": "alice" },
            "public": true,
            "created_at": "2024-05-01T12:00:00Z",
            "payload": payload,
        }))
        .unwrap()
    }

    #[test]
    fn test_issue_event() {
        let event = raw(
            "IssuesEvent",
            json!({
                "action": "opened",
                "issue": { "title": "Crash on start", "html_url": "https://github.com/o/r/issues/1" }
            }),
        )
        .into_activity()
        .unwrap()
        .unwrap();

        match event {
            ActivityEvent::Issue(details) => {
                assert_eq!(details.actor, "alice");
                assert_eq!(details.action, EventAction::Opened);
                assert_eq!(details.title, "Crash on start");
                assert!(details.public);
            }
            other => panic!("Expected issue event, got {:?}", other),
        }
    }

    #[test]
    fn test_merged_pull_request_event() {
        let event = raw(
            "PullRequestEvent",
            json!({
                "action": "closed",
                "pull_request": {
                    "title": "Add lint",
                    "html_url": "https://github.com/o/r/pull/2",
                    "merged": true
                }
            }),
        )
        .into_activity()
        .unwrap()
        .unwrap();

        match event {
            ActivityEvent::PullRequest { details, merged } => {
                assert!(merged);
                assert_eq!(details.action, EventAction::Closed);
            }
            other => panic!("Expected pull request event, got {:?}", other),
        }
    }

    #[test]
    fn test_other_event_types_are_dropped() {
        let event = raw("WatchEvent", json!({ "action": "started" }));
        assert!(event.into_activity().unwrap().is_none());
    }

    #[test]
    fn test_malformed_payload_is_an_error() {
        let event = raw("IssuesEvent", json!({ "action": "opened" }));
        assert!(matches!(event.into_activity(), Err(Error::Json(_))));
    }

    #[test]
    fn test_decode_wrapped_base64() {
        let file = FileContent {
            content: "bmFtZTog\nbGludAo=\n".to_string(),
            encoding: Some("base64".to_string()),
        };
        assert_eq!(file.decode().unwrap(), b"name: lint\n");
    }

    #[test]
    fn test_decode_rejects_unknown_encoding() {
        let file = FileContent {
            content: "x".to_string(),
            encoding: Some("utf-16".to_string()),
        };
        assert!(matches!(file.decode(), Err(Error::Decode { .. })));
    }
}
