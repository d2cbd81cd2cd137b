//! Repository monitor loop
//!
//! The core of repowatch: one pass over every configured repository per
//! cycle, comparing the freshly fetched latest commit against persisted
//! state and dispatching one notification per new commit. State is only
//! advanced after a notification succeeds, so a failed send is retried on
//! the next cycle and a restart never re-notifies an already-reported
//! commit.

use std::sync::Arc;

use eyre::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;
use crate::github::{CommitSource, RepoName};
use crate::notify::Notifier;
use crate::state::{StateMap, StateStore};

/// Outcome of checking a single repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// First successful check; sha recorded, no notification sent
    Baseline,
    /// Latest commit matches stored state
    Unchanged,
    /// New commit detected and notification sent
    Notified,
    /// Fetch failed; state untouched
    FetchFailed,
    /// New commit detected but notification failed; state untouched
    SendFailed,
}

/// Summary of one pass over all configured repositories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub checked: usize,
    pub new_commits: usize,
    pub fetch_failures: usize,
    pub send_failures: usize,
}

/// The repository monitor
pub struct Monitor {
    config: MonitorConfig,
    repos: Vec<RepoName>,
    client: Arc<dyn CommitSource>,
    notifier: Arc<dyn Notifier>,
    store: StateStore,
    last_commits: StateMap,
}

impl Monitor {
    /// Create a new monitor, loading any previously persisted state
    pub fn new(
        config: MonitorConfig,
        repos: Vec<RepoName>,
        client: Arc<dyn CommitSource>,
        notifier: Arc<dyn Notifier>,
        store: StateStore,
    ) -> Self {
        let last_commits = store.load();
        info!(
            entries = last_commits.len(),
            state_file = %store.path().display(),
            "Loaded last-commit state"
        );

        Self {
            config,
            repos,
            client,
            notifier,
            store,
            last_commits,
        }
    }

    /// Check a single repository and dispatch a notification if needed
    ///
    /// Failures are contained here: a fetch or send error is logged and
    /// reflected in the outcome, never propagated, so one repository can
    /// not disturb the rest of the cycle.
    pub async fn check_repo(&mut self, repo: &RepoName) -> CheckOutcome {
        let commit = match self.client.latest_commit(repo).await {
            Ok(commit) => commit,
            Err(e) => {
                warn!(
                    %repo,
                    kind = e.kind(),
                    transient = e.is_transient(),
                    error = %e,
                    "Failed to fetch latest commit"
                );
                return CheckOutcome::FetchFailed;
            }
        };

        let Some(last_sha) = self.last_commits.get(repo.as_str()) else {
            debug!(%repo, sha = %commit.short_sha(), "Recording baseline commit");
            self.record_sha(repo, &commit.sha);
            return CheckOutcome::Baseline;
        };

        if last_sha == &commit.sha {
            debug!(%repo, sha = %commit.short_sha(), "No new commits");
            return CheckOutcome::Unchanged;
        }

        info!(
            %repo,
            old_sha = %last_sha,
            new_sha = %commit.sha,
            author = %commit.author,
            "New push detected"
        );

        if let Err(e) = self.notifier.send(repo, &commit).await {
            // Leave state untouched so the next cycle retries this commit
            warn!(%repo, kind = e.kind(), error = %e, "Failed to send notification");
            return CheckOutcome::SendFailed;
        }

        self.record_sha(repo, &commit.sha);
        CheckOutcome::Notified
    }

    /// Update in-memory state and persist it
    ///
    /// A persistence failure is logged, not fatal: the in-memory map stays
    /// authoritative for the running process.
    fn record_sha(&mut self, repo: &RepoName, sha: &str) {
        self.last_commits.insert(repo.as_str().to_string(), sha.to_string());

        if let Err(e) = self.store.save(&self.last_commits) {
            error!(%repo, error = %e, "Failed to persist state; continuing with in-memory state");
        }
    }

    /// Run one pass over all configured repositories
    pub async fn check_once(&mut self) -> CycleStats {
        let mut stats = CycleStats::default();

        for repo in self.repos.clone() {
            stats.checked += 1;
            match self.check_repo(&repo).await {
                CheckOutcome::Notified => stats.new_commits += 1,
                CheckOutcome::FetchFailed => stats.fetch_failures += 1,
                CheckOutcome::SendFailed => {
                    stats.new_commits += 1;
                    stats.send_failures += 1;
                }
                CheckOutcome::Baseline | CheckOutcome::Unchanged => {}
            }
        }

        stats
    }

    /// Run the monitor loop until shutdown is requested
    pub async fn run(mut self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        info!(
            repos = self.repos.len(),
            interval_secs = self.config.poll_interval_secs,
            "Monitor started"
        );

        loop {
            let stats = self.check_once().await;
            info!(
                checked = stats.checked,
                new_commits = stats.new_commits,
                fetch_failures = stats.fetch_failures,
                send_failures = stats.send_failures,
                "Cycle complete"
            );

            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval()) => {}
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        info!("Monitor stopped");
        Ok(())
    }

    /// The last recorded sha for a repository, if any
    pub fn last_sha(&self, repo: &RepoName) -> Option<&str> {
        self.last_commits.get(repo.as_str()).map(String::as_str)
    }
}
