//! Notification dispatch
//!
//! The Notifier trait is the seam between the monitor loop and the email
//! transport; tests substitute in-memory implementations.

mod email;
mod error;

pub use email::EmailNotifier;
pub use error::SendError;

use async_trait::async_trait;

use crate::github::{CommitInfo, RepoName};

/// Sink for new-commit notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one notification describing one new commit
    async fn send(&self, repo: &RepoName, commit: &CommitInfo) -> Result<(), SendError>;
}
