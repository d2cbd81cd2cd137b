//! Repowatch configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::github::RepoName;

/// Main repowatch configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repositories to monitor, in `owner/name` form
    pub repos: Vec<RepoName>,

    /// GitHub API configuration
    pub github: GithubConfig,

    /// Email notifier configuration
    pub email: EmailConfig,

    /// Polling configuration
    pub monitor: MonitorConfig,

    /// State persistence configuration
    pub storage: StorageConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that required environment variables and addresses are set.
    /// Call this early in startup to fail fast with clear error messages.
    pub fn validate(&self) -> Result<()> {
        if self.repos.is_empty() {
            return Err(eyre::eyre!("No repositories configured. Add at least one under `repos:`."));
        }

        if std::env::var(&self.github.token_env).is_err() {
            return Err(eyre::eyre!(
                "GitHub token not found. Set the {} environment variable.",
                self.github.token_env
            ));
        }

        if std::env::var(&self.email.password_env).is_err() {
            return Err(eyre::eyre!(
                "SMTP password not found. Set the {} environment variable.",
                self.email.password_env
            ));
        }

        if self.email.sender.is_empty() || self.email.recipient.is_empty() {
            return Err(eyre::eyre!("Email sender and recipient must be configured."));
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .repowatch.yml
        let local_config = PathBuf::from(".repowatch.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/repowatch/repowatch.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("repowatch").join("repowatch.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// GitHub API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// Environment variable containing the API token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token_env: "GITHUB_TOKEN".to_string(),
            base_url: "https://api.github.com".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl GithubConfig {
    /// Read the API token from the configured environment variable
    pub fn get_token(&self) -> Result<String> {
        std::env::var(&self.token_env)
            .context(format!("GitHub token environment variable {} not set", self.token_env))
    }
}

/// Email notifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// SMTP server hostname
    #[serde(rename = "smtp-server")]
    pub smtp_server: String,

    /// SMTP port (STARTTLS)
    #[serde(rename = "smtp-port")]
    pub smtp_port: u16,

    /// Sender address (also the SMTP login)
    pub sender: String,

    /// Environment variable containing the SMTP password
    #[serde(rename = "password-env")]
    pub password_env: String,

    /// Recipient address for notifications
    pub recipient: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            sender: String::new(),
            password_env: "REPOWATCH_SMTP_PASSWORD".to_string(),
            recipient: String::new(),
        }
    }
}

impl EmailConfig {
    /// Read the SMTP password from the configured environment variable
    pub fn get_password(&self) -> Result<String> {
        std::env::var(&self.password_env)
            .context(format!("SMTP password environment variable {} not set", self.password_env))
    }
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Seconds between check cycles
    #[serde(rename = "poll-interval-secs")]
    pub poll_interval_secs: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 300,
        }
    }
}

impl MonitorConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// State persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the last-commits state file
    #[serde(rename = "state-file")]
    pub state_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        // Use XDG data directory (~/.local/share/repowatch on Linux)
        let state_file = dirs::data_dir()
            .map(|d| d.join("repowatch"))
            .unwrap_or_else(|| PathBuf::from(".repowatch"))
            .join("last_commits.json");

        Self { state_file }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.repos.is_empty());
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.github.base_url, "https://api.github.com");
        assert_eq!(config.monitor.poll_interval_secs, 300);
        assert_eq!(config.email.smtp_port, 587);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
repos:
  - acme/widgets
  - acme/gadgets

github:
  token-env: MY_TOKEN
  base-url: https://github.example.com/api/v3
  timeout-ms: 10000

email:
  smtp-server: mail.example.com
  smtp-port: 2525
  sender: bot@example.com
  password-env: MAIL_PASSWORD
  recipient: team@example.com

monitor:
  poll-interval-secs: 60
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.repos.len(), 2);
        assert_eq!(config.repos[0].as_str(), "acme/widgets");
        assert_eq!(config.github.token_env, "MY_TOKEN");
        assert_eq!(config.github.base_url, "https://github.example.com/api/v3");
        assert_eq!(config.github.timeout_ms, 10000);
        assert_eq!(config.email.smtp_server, "mail.example.com");
        assert_eq!(config.email.smtp_port, 2525);
        assert_eq!(config.email.sender, "bot@example.com");
        assert_eq!(config.monitor.poll_interval_secs, 60);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
repos:
  - acme/widgets

monitor:
  poll-interval-secs: 30
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified values
        assert_eq!(config.repos.len(), 1);
        assert_eq!(config.monitor.poll_interval_secs, 30);

        // Defaults for unspecified
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert_eq!(config.email.smtp_server, "smtp.gmail.com");
    }

    #[test]
    fn test_deserialize_rejects_bad_repo_name() {
        let yaml = r#"
repos:
  - not-a-repo
"#;

        let result: Result<Config, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_poll_interval_duration() {
        let config = MonitorConfig {
            poll_interval_secs: 60,
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_validate_empty_repos() {
        let config = Config::default();
        let result = config.validate();

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("No repositories"));
    }
}
