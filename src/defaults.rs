//! Default values for community-sync configuration.
//!
//! Every default here can be overridden by a CLI flag or its environment
//! variable, listed next to each constant.

/// GitHub REST endpoint. `--api-url` / `GITHUB_API_URL`.
pub const API_URL: &str = "https://api.github.com";

/// Repository policies. `--repos` / `COMMUNITY_REPOS`.
pub const REPOS_FILE: &str = "repos.toml";

/// Team definitions. `--teams` / `COMMUNITY_TEAMS`.
pub const TEAMS_FILE: &str = "teams.toml";

/// Directory of reference workflow files. `--actions` / `COMMUNITY_ACTIONS`.
pub const ACTIONS_DIR: &str = "actions";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_files_are_toml() {
        assert!(REPOS_FILE.ends_with(".toml"));
        assert!(TEAMS_FILE.ends_with(".toml"));
    }

    #[test]
    fn test_api_url_has_no_trailing_slash() {
        assert!(!API_URL.ends_with('/'));
    }
}
