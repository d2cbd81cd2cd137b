//! Repowatch - GitHub repository push monitor
//!
//! Repowatch polls a configured list of GitHub repositories on a fixed
//! interval, detects newly appeared commits, and emails one notification
//! per new commit. Per-repository state (the last-notified commit sha)
//! persists across restarts so a commit is reported exactly once: state
//! only advances after a notification succeeds, and a failed send is
//! retried on the next cycle.
//!
//! # Modules
//!
//! - [`github`] - CommitSource trait and GitHub API client
//! - [`notify`] - Notifier trait and SMTP email implementation
//! - [`state`] - Persistent last-commit state with atomic saves
//! - [`monitor`] - The check-and-notify polling loop
//! - [`config`] - Configuration types and loading
//! - [`daemon`] - Background process management
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod daemon;
pub mod github;
pub mod monitor;
pub mod notify;
pub mod state;

// Re-export commonly used types
pub use config::{Config, EmailConfig, GithubConfig, MonitorConfig, StorageConfig};
pub use daemon::{DaemonManager, DaemonStatus};
pub use github::{CommitInfo, CommitSource, FetchError, GithubClient, RepoName, RepoNameError};
pub use monitor::{CheckOutcome, CycleStats, Monitor};
pub use notify::{EmailNotifier, Notifier, SendError};
pub use state::{StateMap, StateStore};
