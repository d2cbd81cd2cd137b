//! Repository and commit types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A monitored repository in `owner/name` form
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoName {
    full_name: String,
}

impl RepoName {
    /// Parse an `owner/name` string
    pub fn parse(s: &str) -> Result<Self, RepoNameError> {
        let mut parts = s.splitn(2, '/');
        let owner = parts.next().unwrap_or("");
        let name = parts.next();

        match name {
            Some(name) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => Ok(Self {
                full_name: s.to_string(),
            }),
            _ => Err(RepoNameError(s.to_string())),
        }
    }

    /// The full `owner/name` string
    pub fn as_str(&self) -> &str {
        &self.full_name
    }
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

impl FromStr for RepoName {
    type Err = RepoNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepoName {
    type Error = RepoNameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<RepoName> for String {
    fn from(repo: RepoName) -> Self {
        repo.full_name
    }
}

/// Error for a repository name that is not `owner/name`
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid repository name (expected owner/name): {0}")]
pub struct RepoNameError(pub String);

/// The latest commit for a repository at fetch time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit hash
    pub sha: String,

    /// Author name
    pub author: String,

    /// Commit message
    pub message: String,

    /// Author date
    pub timestamp: DateTime<Utc>,
}

impl CommitInfo {
    /// Web URL for this commit
    pub fn html_url(&self, repo: &RepoName) -> String {
        format!("https://github.com/{}/commit/{}", repo, self.sha)
    }

    /// Short sha for log output
    pub fn short_sha(&self) -> &str {
        match self.sha.char_indices().nth(12) {
            Some((idx, _)) => &self.sha[..idx],
            None => &self.sha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_name_parse_valid() {
        let repo = RepoName::parse("acme/widgets").unwrap();
        assert_eq!(repo.as_str(), "acme/widgets");
        assert_eq!(repo.to_string(), "acme/widgets");
    }

    #[test]
    fn test_repo_name_parse_invalid() {
        assert!(RepoName::parse("no-slash").is_err());
        assert!(RepoName::parse("/leading").is_err());
        assert!(RepoName::parse("trailing/").is_err());
        assert!(RepoName::parse("too/many/parts").is_err());
        assert!(RepoName::parse("").is_err());
    }

    #[test]
    fn test_repo_name_from_str() {
        let repo: RepoName = "acme/widgets".parse().unwrap();
        assert_eq!(repo.as_str(), "acme/widgets");
    }

    #[test]
    fn test_repo_name_serde_round_trip() {
        let repo = RepoName::parse("acme/widgets").unwrap();
        let json = serde_json::to_string(&repo).unwrap();
        assert_eq!(json, "\"acme/widgets\"");

        let back: RepoName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, repo);
    }

    #[test]
    fn test_repo_name_deserialize_rejects_invalid() {
        let result: Result<RepoName, _> = serde_json::from_str("\"not-a-repo\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_commit_html_url() {
        let repo = RepoName::parse("acme/widgets").unwrap();
        let commit = CommitInfo {
            sha: "abc123".to_string(),
            author: "Jane".to_string(),
            message: "Fix".to_string(),
            timestamp: Utc::now(),
        };

        assert_eq!(commit.html_url(&repo), "https://github.com/acme/widgets/commit/abc123");
    }

    #[test]
    fn test_short_sha() {
        let commit = CommitInfo {
            sha: "0123456789abcdef0123456789abcdef01234567".to_string(),
            author: "Jane".to_string(),
            message: "Fix".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(commit.short_sha(), "0123456789ab");

        let short = CommitInfo {
            sha: "abc".to_string(),
            ..commit.clone()
        };
        assert_eq!(short.short_sha(), "abc");

        // Truncation must respect char boundaries, not byte offsets
        let odd = CommitInfo {
            sha: "ábcdéfghíjklmnop".to_string(),
            ..commit
        };
        assert_eq!(odd.short_sha(), "ábcdéfghíjkl");
    }
}
