//! SMTP email notifier implementation

use async_trait::async_trait;
use eyre::{Context, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;

use super::{Notifier, SendError};
use crate::config::EmailConfig;
use crate::github::{CommitInfo, RepoName};

/// Email notifier over SMTP with STARTTLS
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
    recipient: Mailbox,
}

impl EmailNotifier {
    /// Create a new notifier from configuration
    ///
    /// Reads the SMTP password from the environment variable named in config.
    /// No connection is made until the first send.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let password = config.get_password()?;

        let sender: Mailbox = config
            .sender
            .parse()
            .context(format!("Invalid sender address: {}", config.sender))?;
        let recipient: Mailbox = config
            .recipient
            .parse()
            .map_err(SendError::InvalidRecipient)
            .context(format!("Invalid recipient address: {}", config.recipient))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .context(format!("Invalid SMTP server: {}", config.smtp_server))?
            .port(config.smtp_port)
            .credentials(Credentials::new(config.sender.clone(), password))
            .build();

        Ok(Self {
            transport,
            sender,
            recipient,
        })
    }

    fn build_message(&self, repo: &RepoName, commit: &CommitInfo) -> Result<Message, SendError> {
        let message = Message::builder()
            .from(self.sender.clone())
            .to(self.recipient.clone())
            .subject(notification_subject(repo))
            .header(ContentType::TEXT_PLAIN)
            .body(notification_body(repo, commit))?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, repo: &RepoName, commit: &CommitInfo) -> Result<(), SendError> {
        let message = self.build_message(repo, commit)?;

        self.transport
            .send(message)
            .await
            .map_err(SendError::from_transport)?;

        debug!(%repo, sha = %commit.short_sha(), "Email notification sent");
        Ok(())
    }
}

/// Subject line for a new-commit notification
fn notification_subject(repo: &RepoName) -> String {
    format!("New push detected - {}", repo)
}

/// Plain-text body for a new-commit notification
fn notification_body(repo: &RepoName, commit: &CommitInfo) -> String {
    format!(
        "New push detected in {repo}\n\
         \n\
         Author: {author}\n\
         Date: {date}\n\
         Message: {message}\n\
         \n\
         Commit: {url}\n",
        repo = repo,
        author = commit.author,
        date = commit.timestamp.to_rfc2822(),
        message = commit.message,
        url = commit.html_url(repo),
    )
}
