//! Glob matching for repository names

use crate::error::{Error, Result};
use glob::Pattern;

/// A compiled glob pattern matched against repository names.
///
/// Supports `*`, `?` and character classes (`[abc]`, `[!abc]`). Repository
/// names never contain `/`, so `*` spans the whole name.
#[derive(Debug, Clone)]
pub struct Matcher {
    source: String,
    pattern: Pattern,
}

impl Matcher {
    /// Compile a glob pattern.
    pub fn compile(pattern: &str) -> Result<Self> {
        let compiled = Pattern::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.msg.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            pattern: compiled,
        })
    }

    /// The pattern string this matcher was compiled from.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.pattern.matches(candidate)
    }

    /// Returns every name that matches, in input order.
    pub fn expand<'a, I>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        names
            .into_iter()
            .filter(|name| self.matches(name))
            .cloned()
            .collect()
    }
}

/// Match a repository name against a glob pattern
pub fn glob_match(pattern: &str, name: &str) -> Result<bool> {
    Ok(Matcher::compile(pattern)?.matches(name))
}
