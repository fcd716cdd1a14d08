//! Extracting an owner/repo pair from user input.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{RepoMvpError, Result};

static GITHUB_URL_REGEX: OnceLock<Regex> = OnceLock::new();

/// Owner and name of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoReference {
    pub owner: String,
    pub repo: String,
}

impl RepoReference {
    /// Match `github.com/<owner>/<repo>` anywhere in `url`.
    ///
    /// The repo segment loses its query string, fragment and `.git` suffix.
    /// Returns `None` when either part ends up empty.
    pub fn parse(url: &str) -> Option<Self> {
        let regex = GITHUB_URL_REGEX.get_or_init(|| {
            Regex::new(r"github\.com/([^/]+)/([^/]+)").expect("static regex is valid")
        });
        let caps = regex.captures(url)?;

        let owner = caps.get(1)?.as_str();
        let raw_repo = caps.get(2)?.as_str();
        let repo = raw_repo
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let repo = repo.strip_suffix(".git").unwrap_or(repo);

        if owner.is_empty() || repo.is_empty() {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }

    /// API route for the repository record.
    pub fn metadata_route(&self) -> String {
        format!("/repos/{}/{}", self.owner, self.repo)
    }

    /// API route for the repository README.
    pub fn readme_route(&self) -> String {
        format!("/repos/{}/{}/readme", self.owner, self.repo)
    }
}

impl fmt::Display for RepoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Check raw user input and turn it into a repository reference.
///
/// Returns the trimmed input alongside the reference, since the trimmed text
/// is what gets forwarded as `repoUrl`.
pub fn validate_input(input: &str) -> Result<(String, RepoReference)> {
    let input = input.trim();

    if input.is_empty() {
        return Err(RepoMvpError::InvalidInput(
            "Please enter a GitHub repository URL".to_string(),
        ));
    }

    if !input.contains("github.com") {
        return Err(RepoMvpError::InvalidInput(
            "Please enter a valid GitHub URL".to_string(),
        ));
    }

    let parsed = RepoReference::parse(input)
        .ok_or_else(|| RepoMvpError::InvalidInput("Invalid GitHub URL format".to_string()))?;

    sanitize_github_name(&parsed.owner, "owner")?;
    sanitize_github_name(&parsed.repo, "repo")?;

    Ok((input.to_string(), parsed))
}

/// Validate that a GitHub owner/repo name doesn't contain characters that
/// could be used for URL injection in raw API routes.
fn sanitize_github_name(name: &str, field: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RepoMvpError::InvalidInput(format!(
            "{} must not be empty",
            field
        )));
    }
    for ch in ['/', '?', '#', '%', '\0', ' ', '\n', '\t'] {
        if name.contains(ch) {
            return Err(RepoMvpError::InvalidInput(format!(
                "{} contains invalid character '{}'",
                field,
                ch.escape_default()
            )));
        }
    }
    Ok(())
}
