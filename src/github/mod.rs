//! GitHub repository client
//!
//! Fetches the latest commit for each monitored repository via the GitHub
//! REST API. The CommitSource trait is the seam the monitor loop depends on;
//! tests substitute in-memory implementations.

mod client;
mod error;
mod types;

pub use client::{CommitSource, GithubClient};
pub use error::FetchError;
pub use types::{CommitInfo, RepoName, RepoNameError};
