//! # Error Suggestions
//!
//! Errors the CLI raises for mistakes the user can fix, each with `hint:`
//! lines saying how.
//!
//! ```rust,ignore
//! use community_sync::suggestions;
//!
//! return Err(suggestions::config_not_found(path, "--teams", "COMMUNITY_TEAMS"));
//! ```

use std::path::Path;

/// A configuration file does not exist.
pub fn config_not_found(path: &Path, flag: &str, env: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Run from the directory holding your community configuration\n\
         hint: Use {flag} to specify a different path\n\
         hint: Set the {env} environment variable",
        path = path.display()
    )
}

/// The reference workflow directory does not exist.
pub fn actions_dir_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Reference actions directory not found: {path}\n\n\
         hint: Use --actions to point at the directory holding <name>.yml files\n\
         hint: Set the COMMUNITY_ACTIONS environment variable",
        path = path.display()
    )
}

/// A glob given on the command line is malformed.
pub fn invalid_glob(pattern: &str, message: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Invalid glob pattern: {pattern}\n\
         error: {message}\n\n\
         hint: Use * for any run of characters, ? for a single one\n\
         hint: Use [abc] for character classes, [!abc] to negate\n\
         hint: Quote the pattern so your shell does not expand it"
    )
}

/// A named repository is not part of the organization.
pub fn unknown_repo(name: &str, owner: &str, candidates: &[String]) -> anyhow::Error {
    let names: Vec<&str> = candidates.iter().map(String::as_str).collect();
    let did_you_mean = find_similar(name, &names)
        .map(|s| format!("\nhint: Did you mean '{s}'?"))
        .unwrap_or_default();

    anyhow::anyhow!(
        "Repository not found in {owner}: {name}{did_you_mean}\n\n\
         hint: Repository names are case sensitive\n\
         hint: Check that the token can see private repositories"
    )
}

/// A pattern matched no live repository.
pub fn no_repos_matched(pattern: &str, owner: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "No repository in {owner} matches '{pattern}'\n\n\
         hint: Patterns match whole names, use 'go-*' rather than 'go'\n\
         hint: Run with --log-level debug to see the requests made"
    )
}

/// Finds a candidate within edit distance 2 of `input`.
fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Levenshtein distance.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_names_flag_and_env() {
        let message = config_not_found(Path::new("conf/teams.toml"), "--teams", "COMMUNITY_TEAMS")
            .to_string();
        assert!(message.contains("Configuration file not found: conf/teams.toml"));
        assert!(message.contains("hint: Use --teams"));
        assert!(message.contains("COMMUNITY_TEAMS"));
    }

    #[test]
    fn test_actions_dir_not_found() {
        let message = actions_dir_not_found(Path::new("ci")).to_string();
        assert!(message.contains("ci"));
        assert!(message.contains("COMMUNITY_ACTIONS"));
    }

    #[test]
    fn test_unknown_repo_suggests_similar() {
        let candidates = vec!["community".to_string(), "site".to_string()];
        let message = unknown_repo("comunity", "acme", &candidates).to_string();
        assert!(message.contains("Repository not found in acme: comunity"));
        assert!(message.contains("Did you mean 'community'?"));
    }

    #[test]
    fn test_unknown_repo_without_close_match() {
        let candidates = vec!["site".to_string()];
        let message = unknown_repo("storage", "acme", &candidates).to_string();
        assert!(!message.contains("Did you mean"));
    }

    #[test]
    fn test_invalid_glob_and_no_match_hints() {
        assert!(invalid_glob("go-[", "unclosed").to_string().contains("[!abc]"));
        assert!(no_repos_matched("go", "acme").to_string().contains("'go-*'"));
    }

    #[test]
    fn test_edit_distance() {
        assert_eq!(edit_distance("site", "site"), 0);
        assert_eq!(edit_distance("comunity", "community"), 1);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
    }
}
