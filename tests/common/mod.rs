//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! let fixture = TestFixture::new().with_repos(configs::REPOS).with_teams(configs::TEAMS);
//! fixture.command().arg("validate").assert().success();
//! ```

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use community_sync::github::memory::MemoryGithub;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{configs, seeded_org, TestFixture};
}

/// Configuration documents shared across tests.
#[allow(dead_code)]
pub mod configs {
    pub const REPOS: &str = r#"
["*"]
project = ["community"]

["go-service-*"]
project = ["storage"]
action = { required = ["lint"], allowed = ["release"] }
"#;

    pub const TEAMS: &str = r#"
[storage]
description = "Storage services"
project = "storage"

[storage.members]
leader = ["alice"]
committer = ["bob", "carol"]

[docs-reviewers]
role = "reviewer"
repos = ["site"]
members = ["dave"]
"#;

    /// Two equal-length patterns that both match `go-service-s3`.
    pub const COLLIDING: &str = r#"
["go-*-s3"]
project = ["a"]

["*ice-s3"]
project = ["b"]
"#;

    pub const BAD_GLOB: &str = r#"
["go-[service"]
project = ["storage"]
"#;

    pub const INVALID_TOML: &str = "[\"docs\"\nproject = 1";

    pub const LINT_WORKFLOW: &str = "name: lint\non: [push]\n";
}

/// An organization with a few services, a site and a docs repository.
#[allow(dead_code)]
pub fn seeded_org() -> MemoryGithub {
    let github = MemoryGithub::new("acme");
    for repo in ["docs", "go-service-gcs", "go-service-s3", "site"] {
        github.seed_repo(repo);
    }
    github.seed_org_member("alice");
    github.seed_org_member("bob");
    github
}

/// A temporary directory holding configuration files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    pub fn with_repos(self, content: &str) -> Self {
        self.with_file("repos.toml", content)
    }

    pub fn with_teams(self, content: &str) -> Self {
        self.with_file("teams.toml", content)
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn join(&self, path: &str) -> PathBuf {
        self.temp_dir.path().join(path)
    }

    /// A command running in the fixture directory, isolated from the
    /// caller's GitHub environment. Requests go to a closed local port.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("community");
        cmd.current_dir(self.path())
            .env_remove("COMMUNITY_REPOS")
            .env_remove("COMMUNITY_TEAMS")
            .env_remove("COMMUNITY_ACTIONS")
            .env_remove("GITHUB_OWNER")
            .env_remove("GITHUB_TOKEN")
            .env("GITHUB_API_URL", "http://127.0.0.1:9")
            .env("NO_COLOR", "1");
        cmd
    }

    /// `command` with an organization and a token set.
    pub fn github_command(&self) -> assert_cmd::Command {
        let mut cmd = self.command();
        cmd.env("GITHUB_OWNER", "acme").env("GITHUB_TOKEN", "test-token");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
