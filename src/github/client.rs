//! GitHub REST API client implementation
//!
//! Implements the CommitSource trait against the "list commits" endpoint,
//! fetching only the most recent commit per repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CommitInfo, FetchError, RepoName};
use crate::config::GithubConfig;

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 3;

/// Initial backoff delay for retries
const INITIAL_BACKOFF_MS: u64 = 1000;

/// GitHub rejects requests without a User-Agent
const USER_AGENT: &str = concat!("repowatch/", env!("CARGO_PKG_VERSION"));

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 500 | 502 | 503 | 504)
}

/// Source of latest-commit information for monitored repositories
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Fetch the latest commit for a repository
    async fn latest_commit(&self, repo: &RepoName) -> Result<CommitInfo, FetchError>;
}

/// GitHub API client
pub struct GithubClient {
    token: String,
    base_url: String,
    http: Client,
}

impl GithubClient {
    /// Create a new client from configuration
    ///
    /// Reads the API token from the environment variable named in config.
    pub fn from_config(config: &GithubConfig) -> eyre::Result<Self> {
        let token = config.get_token()?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            token,
            base_url: config.base_url.clone(),
            http,
        })
    }

    /// Interpret a 403 response, which GitHub uses for both permission
    /// failures and exhausted rate limits
    fn classify_forbidden(response: &reqwest::Response) -> FetchError {
        let remaining = response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok());

        if remaining == Some("0") {
            let now = Utc::now().timestamp();
            let retry_after = response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<i64>().ok())
                .map(|reset| reset.saturating_sub(now).max(0) as u64)
                .unwrap_or(60);

            return FetchError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            };
        }

        FetchError::Auth(403)
    }
}

#[async_trait]
impl CommitSource for GithubClient {
    async fn latest_commit(&self, repo: &RepoName) -> Result<CommitInfo, FetchError> {
        let url = format!("{}/repos/{}/commits", self.base_url, repo);

        let mut last_error = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt - 1);
                warn!(
                    %repo,
                    attempt,
                    backoff_ms = backoff,
                    "latest_commit: retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff)).await;
            }

            let response = match self
                .http
                .get(&url)
                .query(&[("per_page", "1")])
                .header("authorization", format!("Bearer {}", self.token))
                .header("accept", "application/vnd.github+json")
                .header("x-github-api-version", "2022-11-28")
                .header("user-agent", USER_AGENT)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    debug!(%repo, attempt, error = %e, "latest_commit: network error");
                    last_error = Some(FetchError::Network(e));
                    continue;
                }
            };

            let status = response.status().as_u16();

            match status {
                404 => return Err(FetchError::NotFound(repo.to_string())),
                401 => return Err(FetchError::Auth(401)),
                403 => return Err(Self::classify_forbidden(&response)),
                429 => {
                    let retry_after = response
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|s| s.parse::<u64>().ok())
                        .unwrap_or(60);

                    return Err(FetchError::RateLimited {
                        retry_after: Duration::from_secs(retry_after),
                    });
                }
                s if is_retryable_status(s) && attempt < MAX_RETRIES => {
                    let message = response.text().await.unwrap_or_default();
                    debug!(%repo, attempt, status = s, "latest_commit: retryable error");
                    last_error = Some(FetchError::Api { status: s, message });
                    continue;
                }
                s if !(200..300).contains(&s) => {
                    let message = response.text().await.unwrap_or_default();
                    return Err(FetchError::Api { status: s, message });
                }
                _ => {}
            }

            let commits: Vec<CommitEntry> = response.json().await?;
            let Some(entry) = commits.into_iter().next() else {
                return Err(FetchError::InvalidResponse(format!("{}: repository has no commits", repo)));
            };

            debug!(%repo, sha = %entry.sha, "latest_commit: success");
            return Ok(entry.into_commit_info());
        }

        Err(last_error.unwrap_or_else(|| FetchError::InvalidResponse("Max retries exceeded".to_string())))
    }
}

// GitHub API response types

#[derive(Debug, Deserialize)]
struct CommitEntry {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<CommitAuthor>,
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    name: String,
    date: DateTime<Utc>,
}

impl CommitEntry {
    fn into_commit_info(self) -> CommitInfo {
        let (author, timestamp) = match self.commit.author {
            Some(a) => (a.name, a.date),
            None => ("unknown".to_string(), DateTime::<Utc>::UNIX_EPOCH),
        };

        CommitInfo {
            sha: self.sha,
            author,
            message: self.commit.message,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(408));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(422));
    }

    #[test]
    fn test_parse_commits_response() {
        let json = r#"[
            {
                "sha": "6dcb09b5b57875f334f61aebed695e2e4193db5e",
                "commit": {
                    "author": {
                        "name": "Monalisa Octocat",
                        "email": "support@github.com",
                        "date": "2011-04-14T16:00:49Z"
                    },
                    "message": "Fix all the bugs"
                },
                "html_url": "https://github.com/octocat/Hello-World/commit/6dcb09b5"
            }
        ]"#;

        let commits: Vec<CommitEntry> = serde_json::from_str(json).unwrap();
        assert_eq!(commits.len(), 1);

        let info = commits.into_iter().next().unwrap().into_commit_info();
        assert_eq!(info.sha, "6dcb09b5b57875f334f61aebed695e2e4193db5e");
        assert_eq!(info.author, "Monalisa Octocat");
        assert_eq!(info.message, "Fix all the bugs");
        assert_eq!(info.timestamp.to_rfc3339(), "2011-04-14T16:00:49+00:00");
    }

    #[test]
    fn test_parse_commit_without_author() {
        let json = r#"[
            {
                "sha": "abc123",
                "commit": {
                    "author": null,
                    "message": "orphan commit"
                }
            }
        ]"#;

        let commits: Vec<CommitEntry> = serde_json::from_str(json).unwrap();
        let info = commits.into_iter().next().unwrap().into_commit_info();
        assert_eq!(info.author, "unknown");
        assert_eq!(info.message, "orphan commit");
    }

    #[test]
    fn test_parse_empty_response() {
        let commits: Vec<CommitEntry> = serde_json::from_str("[]").unwrap();
        assert!(commits.is_empty());
    }
}
